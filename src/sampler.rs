//! Monte-Carlo sampler of capacity feasible customer subsets.
//!
//! For every route size `n` the sampler draws `n` distinct customers uniformly at
//! random and keeps the draw when its aggregated mass and volume fit into one
//! vehicle and it was not drawn before at this size. Draws are independent; no
//! effort is made to steer towards feasible customers.

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;

use crate::config::{DedupKey, SamplerConfig};
use crate::instance::Instance;
use crate::model::{AggregateDemand, Vehicle};
use crate::tables::InstanceView;

/// Id of the depot node prepended to every route.
pub const DEPOT_ID: usize = 0;

/// Capacities and per-customer loads the sampler checks draws against.
#[derive(Debug, Clone)]
pub struct SamplingProblem {
    pub instance_name: String,
    /// Customers are numbered `1..=max_customers`
    pub max_customers: usize,
    pub max_mass: f64,
    pub max_volume: f64,
    agg_mass: HashMap<usize, f64>,
    agg_volume: HashMap<usize, f64>,
}

impl SamplingProblem {
    /// Create a problem from capacities and aggregated demands.
    ///
    /// A customer listed twice keeps its last aggregate.
    pub fn new<'a>(
        instance_name: &str,
        max_customers: usize,
        vehicle: &Vehicle,
        aggregates: impl IntoIterator<Item = &'a AggregateDemand>,
    ) -> Self {
        let mut agg_mass = HashMap::new();
        let mut agg_volume = HashMap::new();
        for agg in aggregates {
            agg_mass.insert(agg.customer_id, agg.mass);
            agg_volume.insert(agg.customer_id, agg.volume);
        }

        SamplingProblem {
            instance_name: instance_name.to_string(),
            max_customers,
            max_mass: vehicle.mass_capacity,
            max_volume: vehicle.cargo_volume(),
            agg_mass,
            agg_volume,
        }
    }

    pub fn from_instance(instance: &Instance) -> Self {
        Self::new(
            instance.name(),
            instance.header.num_customers,
            instance.vehicle(),
            &instance.aggregate_demands,
        )
    }

    pub fn from_view(view: &InstanceView<'_>) -> Self {
        Self::new(
            view.name(),
            view.num_customers(),
            &view.vehicle(),
            view.aggregate_demands.iter().copied(),
        )
    }

    /// Aggregated mass of a customer, 0 without demand.
    pub fn mass_of(&self, customer_id: usize) -> f64 {
        self.agg_mass.get(&customer_id).copied().unwrap_or(0.0)
    }

    /// Aggregated volume of a customer, 0 without demand.
    pub fn volume_of(&self, customer_id: usize) -> f64 {
        self.agg_volume.get(&customer_id).copied().unwrap_or(0.0)
    }

    /// Check whether the customers fit into one vehicle together.
    pub fn is_feasible(&self, customers: &[usize]) -> bool {
        let volume: f64 = customers.iter().map(|&c| self.volume_of(c)).sum();
        let mass: f64 = customers.iter().map(|&c| self.mass_of(c)).sum();
        volume <= self.max_volume && mass <= self.max_mass
    }
}

/// An accepted route: the depot followed by the drawn customers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledRoute {
    /// Number of customers, depot excluded
    pub customer_count: usize,
    /// Position of the route within its size level
    pub index: usize,
    pub route: Vec<usize>,
}

impl SampledRoute {
    /// The customers without the leading depot.
    pub fn customers(&self) -> &[usize] {
        &self.route[1..]
    }

    /// Artifact name `{instance}_{customer_count}_{index}`.
    pub fn file_stem(&self, instance_name: &str) -> String {
        format!("{}_{}_{}", instance_name, self.customer_count, self.index)
    }
}

/// Counters of one sampling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SamplingStats {
    pub created: usize,
    pub duplicates: usize,
    pub levels_attempted: usize,
    /// Route size whose slots were all exhausted, ending the run
    pub stopped_early_at: Option<usize>,
}

/// Routes and counters of one sampling run.
#[derive(Debug, Clone, Default)]
pub struct SamplingReport {
    pub routes: Vec<SampledRoute>,
    pub stats: SamplingStats,
}

/// Draws capacity feasible, duplicate free routes.
pub struct FeasibilitySampler {
    config: SamplerConfig,
}

impl FeasibilitySampler {
    pub fn new(config: SamplerConfig) -> Self {
        FeasibilitySampler { config }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Sample routes for all sizes and collect them.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        problem: &SamplingProblem,
        rng: &mut R,
    ) -> SamplingReport {
        let mut routes = Vec::new();
        let stats = match self.sample_with(problem, rng, |route| -> Result<(), Infallible> {
            routes.push(route);
            Ok(())
        }) {
            Ok(stats) => stats,
            Err(never) => match never {},
        };

        SamplingReport { routes, stats }
    }

    /// Sample routes for all sizes, handing every accepted route to `sink`.
    ///
    /// Only an error returned by `sink` stops the run with an error.
    pub fn sample_with<R, F, E>(
        &self,
        problem: &SamplingProblem,
        rng: &mut R,
        mut sink: F,
    ) -> Result<SamplingStats, E>
    where
        R: Rng + ?Sized,
        F: FnMut(SampledRoute) -> Result<(), E>,
    {
        let mut stats = SamplingStats::default();
        let mut universe: Vec<usize> = (1..=problem.max_customers).collect();
        let min_customers = self.config.min_customers.max(1);

        for num_customers in min_customers..=problem.max_customers {
            stats.levels_attempted += 1;
            let exhausted = self.sample_level(
                problem,
                num_customers,
                &mut universe,
                rng,
                &mut stats,
                &mut sink,
            )?;
            let slots = num_customers * self.config.multiplier_customer_number;

            debug!(
                "{}: size {} done, {} of {} slots exhausted",
                problem.instance_name, num_customers, exhausted, slots
            );

            if exhausted >= slots {
                stats.stopped_early_at = Some(num_customers);
                break;
            }
        }

        info!(
            "{}: created {} routes, avoided {} duplicates",
            problem.instance_name, stats.created, stats.duplicates
        );
        Ok(stats)
    }

    /// Run all slots of one route size; returns the number of slots without any success.
    fn sample_level<R, F, E>(
        &self,
        problem: &SamplingProblem,
        num_customers: usize,
        universe: &mut [usize],
        rng: &mut R,
        stats: &mut SamplingStats,
        sink: &mut F,
    ) -> Result<usize, E>
    where
        R: Rng + ?Sized,
        F: FnMut(SampledRoute) -> Result<(), E>,
    {
        let threshold = self.config.successful_instances_threshold;
        let mut seen: HashSet<Vec<usize>> = HashSet::new();
        let mut exhausted = 0;

        for slot in 0..num_customers * self.config.multiplier_customer_number {
            let mut successes = 0;
            let mut attempts = 0;
            let mut breakup = 0;
            let mut found = false;

            while successes < threshold {
                let (drawn, _) = universe.partial_shuffle(rng, num_customers);
                let perm = drawn.to_vec();

                if !seen.insert(self.dedup_key(&perm)) {
                    stats.duplicates += 1;
                    breakup += 1;
                } else if !problem.is_feasible(&perm) {
                    attempts += 1;
                } else {
                    let mut route = Vec::with_capacity(num_customers + 1);
                    route.push(DEPOT_ID);
                    route.extend(perm);
                    sink(SampledRoute {
                        customer_count: num_customers,
                        index: slot * threshold + successes,
                        route,
                    })?;

                    successes += 1;
                    stats.created += 1;
                    attempts = 0;
                    breakup = 0;
                    found = true;
                    continue;
                }

                if attempts >= self.config.attempt_limit {
                    attempts = 0;
                    breakup += 1;
                }

                if breakup >= threshold {
                    if !found {
                        exhausted += 1;
                    }
                    break;
                }
            }
        }

        Ok(exhausted)
    }

    fn dedup_key(&self, perm: &[usize]) -> Vec<usize> {
        match self.config.dedup {
            DedupKey::Sequence => perm.to_vec(),
            DedupKey::Combination => {
                let mut key = perm.to_vec();
                key.sort_unstable();
                key
            }
        }
    }
}
