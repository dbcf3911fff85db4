//! Configuration parameters for the route sampler.

use serde::{Deserialize, Serialize};

/// What two drawn routes must share to count as duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DedupKey {
    /// The same set of customers, in any order
    #[default]
    Combination,
    /// The same customers in the same order
    Sequence,
}

/// Configuration settings for the feasibility sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Attempt slots per level are `customer count × multiplier`
    pub multiplier_customer_number: usize,
    /// Infeasible draws tolerated before a slot records a breakup
    pub attempt_limit: usize,
    /// Accepted routes wanted per slot, also the breakup limit of a slot
    pub successful_instances_threshold: usize,
    /// Smallest number of customers per route
    pub min_customers: usize,
    /// Duplicate detection key
    pub dedup: DedupKey,
    /// Seed of the random generator used by the command line tool
    pub seed: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            multiplier_customer_number: 2,
            attempt_limit: 40,
            successful_instances_threshold: 40,
            min_customers: 2,
            dedup: DedupKey::Combination,
            seed: 8,
        }
    }
}

impl SamplerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        SamplerConfig::default()
    }

    /// Set the slot multiplier.
    pub fn with_multiplier_customer_number(mut self, multiplier: usize) -> Self {
        self.multiplier_customer_number = multiplier;
        self
    }

    /// Set the attempt limit.
    pub fn with_attempt_limit(mut self, limit: usize) -> Self {
        self.attempt_limit = limit;
        self
    }

    /// Set the number of accepted routes per slot.
    pub fn with_successful_instances_threshold(mut self, threshold: usize) -> Self {
        self.successful_instances_threshold = threshold;
        self
    }

    /// Set the smallest route size.
    pub fn with_min_customers(mut self, min_customers: usize) -> Self {
        self.min_customers = min_customers;
        self
    }

    /// Set the duplicate detection key.
    pub fn with_dedup(mut self, dedup: DedupKey) -> Self {
        self.dedup = dedup;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Name of the output subfolder used for one parameter combination.
    pub fn run_folder_name(&self) -> String {
        format!(
            "RandomData_{}_{}_{}",
            self.multiplier_customer_number, self.attempt_limit, self.successful_instances_threshold
        )
    }
}
