//! Adaptive Drift Tracker - turns observed outcomes into weight snapshots.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

use super::record::reasoning;
use super::{DriftError, DriftKind, DriftPolicy, DriftRecord, OutcomeMetrics, WeightStore};
use crate::domain::foundation::{AlternativeId, ObservationId, Timestamp, ValidationError};
use crate::domain::mcda::EngineWeights;

/// One reported outcome for a previously ranked alternative.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftObservation {
    pub alternative_id: AlternativeId,
    pub observation_id: ObservationId,
    pub predicted: OutcomeMetrics,
    pub actual: OutcomeMetrics,
}

#[derive(Debug, Clone)]
pub struct DriftOutcome {
    pub record: DriftRecord,
    /// Snapshot active after this call.
    pub weights: Arc<EngineWeights>,
    /// False when the observation was already recorded.
    pub applied: bool,
    /// The alternative has been late more often than the policy tolerates.
    pub repeated_underperformance: bool,
}

#[derive(Debug, Default)]
struct DriftLog {
    by_observation: HashMap<ObservationId, DriftRecord>,
    by_alternative: HashMap<AlternativeId, Vec<ObservationId>>,
}

impl DriftLog {
    fn late_count(&self, alternative_id: &AlternativeId) -> usize {
        self.records_for(alternative_id)
            .filter(|r| r.is_late())
            .count()
    }

    fn records_for<'a>(
        &'a self,
        alternative_id: &AlternativeId,
    ) -> impl Iterator<Item = &'a DriftRecord> + 'a {
        self.by_alternative
            .get(alternative_id)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.by_observation.get(id))
    }
}

/// Compares predictions with observed outcomes and adapts engine weights.
///
/// Each new observation yields a new `EngineWeights` snapshot in the
/// `WeightStore`. Observations are deduplicated on their id, so replays are
/// harmless.
pub struct DriftTracker {
    policy: DriftPolicy,
    store: Arc<WeightStore>,
    log: Mutex<DriftLog>,
}

impl DriftTracker {
    pub fn new(policy: DriftPolicy, store: Arc<WeightStore>) -> Result<Self, DriftError> {
        policy.validate()?;
        Ok(Self {
            policy,
            store,
            log: Mutex::new(DriftLog::default()),
        })
    }

    pub fn policy(&self) -> &DriftPolicy {
        &self.policy
    }

    pub fn store(&self) -> &Arc<WeightStore> {
        &self.store
    }

    /// Records an outcome and installs the adjusted weight snapshot.
    ///
    /// # Algorithm
    /// 1. driftTime = actual − predicted time, driftCost likewise.
    /// 2. magnitude = sqrt(driftTime² + (driftCost / costScale)²).
    /// 3. time += step when more than the time tolerance late, cost += step
    ///    when more than the cost tolerance over, reliability −= step.
    /// 4. Floor at 0, renormalize, store as the next snapshot.
    ///
    /// # Edge Cases
    /// - Already-seen observation id: original record, current snapshot,
    ///   `applied = false`
    /// - Criterion missing from the snapshot: skipped
    pub fn record(&self, observation: DriftObservation) -> Result<DriftOutcome, DriftError> {
        let DriftObservation {
            alternative_id,
            observation_id,
            predicted,
            actual,
        } = observation;

        let predicted = OutcomeMetrics::new(predicted.time, predicted.cost)?;
        let actual = OutcomeMetrics::new(actual.time, actual.cost)?;

        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = log.by_observation.get(&observation_id) {
            info!(
                observation_id = %observation_id,
                "Observation already recorded, skipping weight update"
            );
            return Ok(DriftOutcome {
                record: existing.clone(),
                weights: self.store.current(),
                applied: false,
                repeated_underperformance: log.late_count(&alternative_id)
                    > self.policy.underperformance_threshold,
            });
        }

        let drift_time = actual.time - predicted.time;
        let drift_cost = actual.cost - predicted.cost;
        let drift_magnitude = (drift_time.powi(2) + (drift_cost / self.policy.cost_scale).powi(2)).sqrt();
        let delta = self.propose(drift_time, drift_cost);

        let weights = self
            .store
            .advance(|current| apply_delta(current, &delta).map_err(DriftError::from))?;

        let record = DriftRecord {
            alternative_id: alternative_id.clone(),
            observation_id: observation_id.clone(),
            predicted,
            actual,
            drift_time,
            drift_cost,
            drift_magnitude,
            drift_kind: DriftKind::classify(drift_time, drift_cost),
            proposed_weight_delta: delta,
            reasoning: reasoning(drift_time, drift_cost),
            weights_version: weights.version(),
            recorded_at: Timestamp::now(),
        };

        log.by_observation.insert(observation_id.clone(), record.clone());
        log.by_alternative
            .entry(alternative_id.clone())
            .or_default()
            .push(observation_id.clone());

        info!(
            alternative_id = %alternative_id,
            observation_id = %observation_id,
            magnitude = drift_magnitude,
            kind = %record.drift_kind,
            version = %weights.version(),
            "Drift recorded, new weight snapshot installed"
        );

        let late = log.late_count(&alternative_id);
        let repeated_underperformance = late > self.policy.underperformance_threshold;
        if repeated_underperformance {
            warn!(
                alternative_id = %alternative_id,
                late_deliveries = late,
                threshold = self.policy.underperformance_threshold,
                "Repeated underperformance detected"
            );
        }

        Ok(DriftOutcome {
            record,
            weights,
            applied: true,
            repeated_underperformance,
        })
    }

    /// Every record for an alternative, oldest first.
    pub fn records_for(&self, alternative_id: &AlternativeId) -> Vec<DriftRecord> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .records_for(alternative_id)
            .cloned()
            .collect()
    }

    pub fn find(&self, observation_id: &ObservationId) -> Option<DriftRecord> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_observation
            .get(observation_id)
            .cloned()
    }

    fn propose(&self, drift_time: f64, drift_cost: f64) -> BTreeMap<String, f64> {
        let step = self.policy.weight_step;
        let mut delta = BTreeMap::new();
        delta.insert(
            self.policy.time_criterion.clone(),
            if drift_time > self.policy.time_tolerance_days { step } else { 0.0 },
        );
        delta.insert(
            self.policy.cost_criterion.clone(),
            if drift_cost > self.policy.cost_tolerance { step } else { 0.0 },
        );
        delta.insert(self.policy.reliability_criterion.clone(), -step);
        delta
    }
}

/// Adds the delta to the snapshot weights it names, floors at 0 and
/// renormalizes.
fn apply_delta(
    current: &EngineWeights,
    delta: &BTreeMap<String, f64>,
) -> Result<EngineWeights, ValidationError> {
    let mut next = current.weights().clone();
    for (criterion, change) in delta {
        if let Some(weight) = next.get_mut(criterion) {
            *weight = (*weight + change).max(0.0);
        }
    }

    let total: f64 = next.values().sum();
    if total <= 0.0 {
        return Err(ValidationError::out_of_range("weights_sum", 0.0, 1.0, total));
    }
    for weight in next.values_mut() {
        *weight /= total;
    }

    current.successor(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::WeightsVersion;
    use crate::domain::mcda::WEIGHT_SUM_TOLERANCE;

    const EPS: f64 = 1e-12;

    fn tracker() -> DriftTracker {
        DriftTracker::new(DriftPolicy::default(), Arc::new(WeightStore::default())).unwrap()
    }

    fn observation(obs: &str, predicted: (f64, f64), actual: (f64, f64)) -> DriftObservation {
        DriftObservation {
            alternative_id: AlternativeId::new("dhl").unwrap(),
            observation_id: ObservationId::new(obs).unwrap(),
            predicted: OutcomeMetrics::new(predicted.0, predicted.1).unwrap(),
            actual: OutcomeMetrics::new(actual.0, actual.1).unwrap(),
        }
    }

    fn sum(weights: &EngineWeights) -> f64 {
        weights.weights().values().sum()
    }

    #[test]
    fn late_delivery_raises_time_weight() {
        let t = tracker();
        let outcome = t.record(observation("s1", (5.0, 1000.0), (8.0, 1000.0))).unwrap();

        assert!(outcome.applied);
        assert_eq!(outcome.record.proposed_weight_delta["time"], 0.05);
        assert_eq!(outcome.record.proposed_weight_delta["cost"], 0.0);
        assert_eq!(outcome.record.proposed_weight_delta["reliability"], -0.05);

        // (0.35, 0.4, 0.25) already sums to 1
        let w = &outcome.weights;
        assert!(w.get("time").unwrap() > 0.3);
        assert!((w.get("time").unwrap() - 0.35).abs() < EPS);
        assert!((w.get("reliability").unwrap() - 0.25).abs() < EPS);
        assert!((sum(w) - 1.0).abs() < WEIGHT_SUM_TOLERANCE);
        assert_eq!(outcome.weights.version().value(), 2);
        assert_eq!(outcome.record.weights_version.value(), 2);
    }

    #[test]
    fn on_time_delivery_leaves_time_delta_at_zero() {
        let t = tracker();
        let outcome = t.record(observation("s1", (5.0, 1000.0), (5.5, 1000.0))).unwrap();

        assert_eq!(outcome.record.proposed_weight_delta["time"], 0.0);
        // reliability −0.05 leaves 0.95 to renormalize
        let w = &outcome.weights;
        assert!((w.get("time").unwrap() - 0.3 / 0.95).abs() < EPS);
        assert!((sum(w) - 1.0).abs() < WEIGHT_SUM_TOLERANCE);
    }

    #[test]
    fn exactly_one_day_late_is_within_tolerance() {
        let t = tracker();
        let outcome = t.record(observation("s1", (5.0, 1000.0), (6.0, 1000.0))).unwrap();
        assert_eq!(outcome.record.proposed_weight_delta["time"], 0.0);
        assert!(outcome.record.reasoning.contains("late"));
    }

    #[test]
    fn cost_overrun_raises_cost_weight() {
        let t = tracker();
        let outcome = t.record(observation("s1", (5.0, 1000.0), (5.0, 1300.0))).unwrap();
        assert_eq!(outcome.record.proposed_weight_delta["cost"], 0.05);
        assert!((outcome.weights.get("cost").unwrap() - 0.45).abs() < EPS);
        assert_eq!(outcome.record.drift_kind, DriftKind::CostVariance);
        assert_eq!(
            outcome.record.reasoning,
            "Detected drift: delivery on-time, cost higher than expected"
        );
    }

    #[test]
    fn magnitude_scales_cost_by_policy() {
        let t = tracker();
        let outcome = t.record(observation("s1", (5.0, 1000.0), (8.0, 1400.0))).unwrap();
        assert!((outcome.record.drift_magnitude - 5.0).abs() < EPS);
        assert_eq!(outcome.record.drift_kind, DriftKind::Combined);
    }

    #[test]
    fn replayed_observation_is_not_applied_twice() {
        let t = tracker();
        let first = t.record(observation("s1", (5.0, 1000.0), (8.0, 1000.0))).unwrap();
        let replay = t.record(observation("s1", (5.0, 1000.0), (8.0, 1000.0))).unwrap();

        assert!(!replay.applied);
        assert_eq!(replay.record, first.record);
        assert_eq!(replay.weights.version(), first.weights.version());
        assert_eq!(t.store().history().len(), 2);
        assert_eq!(t.records_for(&AlternativeId::new("dhl").unwrap()).len(), 1);
    }

    #[test]
    fn successive_observations_chain_snapshots() {
        let t = tracker();
        t.record(observation("s1", (5.0, 1000.0), (8.0, 1000.0))).unwrap();
        let second = t.record(observation("s2", (5.0, 1000.0), (8.0, 1000.0))).unwrap();

        assert_eq!(second.weights.version().value(), 3);
        let v1 = t.store().snapshot(WeightsVersion::INITIAL).unwrap();
        assert_eq!(v1.get("time"), Some(0.3));
    }

    #[test]
    fn weights_are_floored_at_zero() {
        let store = Arc::new(WeightStore::new(
            EngineWeights::initial(
                [("cost", 0.5), ("time", 0.48), ("reliability", 0.02)]
                    .iter()
                    .map(|(k, v)| (k.to_string(), *v))
                    .collect(),
            )
            .unwrap(),
        ));
        let t = DriftTracker::new(DriftPolicy::default(), store).unwrap();
        let outcome = t.record(observation("s1", (5.0, 1000.0), (5.0, 1000.0))).unwrap();
        assert_eq!(outcome.weights.get("reliability"), Some(0.0));
        assert!((sum(&outcome.weights) - 1.0).abs() < WEIGHT_SUM_TOLERANCE);
    }

    #[test]
    fn missing_criteria_are_skipped() {
        let store = Arc::new(WeightStore::new(
            EngineWeights::initial(
                [("cost", 0.6), ("time", 0.4)]
                    .iter()
                    .map(|(k, v)| (k.to_string(), *v))
                    .collect(),
            )
            .unwrap(),
        ));
        let t = DriftTracker::new(DriftPolicy::default(), store).unwrap();
        let outcome = t.record(observation("s1", (5.0, 1000.0), (8.0, 1000.0))).unwrap();
        assert!(outcome.weights.get("reliability").is_none());
        assert!((outcome.weights.get("time").unwrap() - 0.45 / 1.05).abs() < EPS);
    }

    #[test]
    fn repeated_lateness_is_flagged() {
        let t = tracker();
        let mut last = None;
        for i in 0..3 {
            last = Some(
                t.record(observation(&format!("s{}", i), (5.0, 1000.0), (7.0, 1000.0)))
                    .unwrap(),
            );
        }
        assert!(last.unwrap().repeated_underperformance);

        let other = DriftObservation {
            alternative_id: AlternativeId::new("dsv").unwrap(),
            ..observation("s9", (5.0, 1000.0), (7.0, 1000.0))
        };
        assert!(!t.record(other).unwrap().repeated_underperformance);
    }

    #[test]
    fn invalid_policy_is_rejected() {
        let policy = DriftPolicy {
            weight_step: 0.0,
            ..DriftPolicy::default()
        };
        assert!(DriftTracker::new(policy, Arc::new(WeightStore::default())).is_err());
    }
}
