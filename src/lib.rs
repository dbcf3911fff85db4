//! # cvrp3l-gen
//!
//! Instance generation for the capacitated vehicle routing problem with
//! three-dimensional loading constraints (3L-CVRP).
//!
//! Benchmark instances are parsed from their fixed text format into tables of
//! items, customers and demands. Random customer subsets whose aggregated mass
//! and volume fit into a single vehicle are then sampled from each instance and
//! written out as new, smaller instances in JSON or text form.
//!
//! Only aggregate capacities are checked; no packing is attempted and routes are
//! not optimized.

pub mod batch;
pub mod cleanup;
pub mod config;
pub mod dataset;
pub mod error;
pub mod export;
pub mod instance;
pub mod model;
pub mod parser;
pub mod sampler;
pub mod tables;
pub mod utils;

pub use crate::config::{DedupKey, SamplerConfig};
pub use crate::error::{Error, Result};
pub use crate::export::{ExportFormat, NodeStyle, RouteExporter};
pub use crate::instance::Instance;
pub use crate::parser::ParserOptions;
pub use crate::sampler::{FeasibilitySampler, SampledRoute, SamplingProblem};
pub use crate::tables::{InstanceTables, InstanceView};

use log::info;
use rand::Rng;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::export::ensure_dir;

/// Totals of one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerationSummary {
    pub created: usize,
    pub duplicates: usize,
}

impl std::ops::AddAssign for GenerationSummary {
    fn add_assign(&mut self, other: Self) {
        self.created += other.created;
        self.duplicates += other.duplicates;
    }
}

/// Samples routes of one instance and writes each of them as an artifact.
pub struct InstanceGenerator<'a> {
    pub view: InstanceView<'a>,
    pub sampler: FeasibilitySampler,
    pub exporter: Box<dyn RouteExporter>,
    pub run_time: Duration,
}

impl<'a> InstanceGenerator<'a> {
    /// Create a generator for the instance behind `view`.
    pub fn new(view: InstanceView<'a>, config: SamplerConfig, format: ExportFormat) -> Self {
        InstanceGenerator {
            view,
            sampler: FeasibilitySampler::new(config),
            exporter: format.exporter(),
            run_time: Duration::from_secs(0),
        }
    }

    /// Capacities and aggregated loads the sampler works on.
    pub fn problem(&self) -> SamplingProblem {
        SamplingProblem::from_view(&self.view)
    }

    /// Sample all route sizes, writing every accepted route into `output_dir`.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        output_dir: &Path,
    ) -> Result<GenerationSummary> {
        let start_time = Instant::now();
        ensure_dir(output_dir)?;

        let problem = self.problem();
        let view = &self.view;
        let exporter = &self.exporter;
        let stats = self.sampler.sample_with(&problem, rng, |route| {
            exporter.write_route(view, &route, output_dir).map(|_| ())
        })?;

        self.run_time = start_time.elapsed();
        info!(
            "{}: {} routes written to {:?} in {}",
            self.view.name(),
            stats.created,
            output_dir,
            utils::format_duration(self.run_time)
        );

        Ok(GenerationSummary {
            created: stats.created,
            duplicates: stats.duplicates,
        })
    }
}
