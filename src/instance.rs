//! The parsed benchmark instance and its derived metrics.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::model::{AggregateDemand, Customer, Demand, Item, Vehicle};
use crate::parser::{InstanceParser, ParserOptions};

/// Scalar header values of an instance file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceHeader {
    pub folder_name: String,
    pub name: String,
    pub num_customers: usize,
    pub num_items: usize,
    pub num_item_types: usize,
    pub num_vehicles: usize,
    pub time_windows: u32,
    pub vehicle: Vehicle,
    /// Unit divider that was applied to the geometry of this instance
    pub divider: f64,
}

/// Vehicle count lower bounds derived from the total demand.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LowerBounds {
    /// Total demanded volume over cargo volume
    pub volume: f64,
    /// Total demanded mass over mass capacity
    pub mass: f64,
    pub coverage_volume: f64,
    /// Kept as `volume / num_vehicles` for compatibility with existing tables,
    /// see [`LowerBounds::corrected_coverage_mass`].
    pub coverage_mass: f64,
    pub corrected_coverage_mass: f64,
}

/// A complete benchmark instance read from one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    pub header: InstanceHeader,
    /// Node 0, when the file lists it
    pub depot: Option<Customer>,
    pub customers: Vec<Customer>,
    pub items: Vec<Item>,
    pub demands: Vec<Demand>,
    pub aggregate_demands: Vec<AggregateDemand>,
    pub bounds: LowerBounds,
}

impl Instance {
    /// Assemble an instance and compute its lower bounds.
    pub fn new(
        header: InstanceHeader,
        depot: Option<Customer>,
        customers: Vec<Customer>,
        items: Vec<Item>,
        demands: Vec<Demand>,
        aggregate_demands: Vec<AggregateDemand>,
    ) -> Self {
        let bounds = Self::compute_lower_bounds(&header, &items, &demands);

        Instance {
            header,
            depot,
            customers,
            items,
            demands,
            aggregate_demands,
            bounds,
        }
    }

    /// Load an instance from a file with default parser options.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file_with(path, &ParserOptions::default())
    }

    /// Load an instance from a file.
    pub fn from_file_with<P: AsRef<Path>>(path: P, options: &ParserOptions) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        InstanceParser::new(path, options.clone()).parse_str(&content)
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.header.vehicle
    }

    pub fn cargo_volume(&self) -> f64 {
        self.header.vehicle.cargo_volume()
    }

    /// Find an item by its type.
    pub fn item(&self, item_type: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.item_type == item_type)
    }

    fn compute_lower_bounds(
        header: &InstanceHeader,
        items: &[Item],
        demands: &[Demand],
    ) -> LowerBounds {
        let mut total_volume = 0.0;
        let mut total_mass = 0.0;

        for demand in demands {
            for item in items.iter().filter(|item| item.item_type == demand.item_type) {
                total_volume += item.volume * demand.quantity as f64;
                total_mass += item.mass * demand.quantity as f64;
            }
        }

        let volume = total_volume / header.vehicle.cargo_volume();
        let mass = total_mass / header.vehicle.mass_capacity;
        let vehicles = header.num_vehicles as f64;

        LowerBounds {
            volume,
            mass,
            coverage_volume: volume / vehicles,
            coverage_mass: volume / vehicles,
            corrected_coverage_mass: mass / vehicles,
        }
    }

    /// The summary row of this instance for the instance table.
    pub fn summary(&self) -> InstanceSummary {
        let header = &self.header;
        InstanceSummary {
            folder_name: header.folder_name.clone(),
            instance_name: header.name.clone(),
            num_customers: header.num_customers,
            num_items: header.num_items,
            num_item_types: header.num_item_types,
            num_vehicles: header.num_vehicles,
            time_windows: header.time_windows,
            vehicle_capacity: header.vehicle.mass_capacity,
            cargo_length: header.vehicle.cargo_length,
            cargo_width: header.vehicle.cargo_width,
            cargo_height: header.vehicle.cargo_height,
            cargo_volume: round2(self.cargo_volume()),
            lb_volume: round2(self.bounds.volume),
            lb_mass: round2(self.bounds.mass),
            coverage_mass: round2(self.bounds.coverage_mass),
            coverage_volume: round2(self.bounds.coverage_volume),
        }
    }

    /// Z-scores of the item geometry and mass columns.
    ///
    /// Uses the sample standard deviation; a column without spread yields NaN.
    pub fn standardized_items(&self) -> Vec<StandardizedItem> {
        let column = |f: fn(&Item) -> f64| -> (f64, f64) {
            let values: Vec<f64> = self.items.iter().map(f).collect();
            mean_and_std(&values)
        };
        let length = column(|item| item.length);
        let width = column(|item| item.width);
        let height = column(|item| item.height);
        let mass = column(|item| item.mass);
        let volume = column(|item| item.volume);

        self.items
            .iter()
            .map(|item| StandardizedItem {
                item_type: item.item_type.clone(),
                length: z_score(item.length, length),
                width: z_score(item.width, width),
                height: z_score(item.height, height),
                mass: z_score(item.mass, mass),
                volume: z_score(item.volume, volume),
            })
            .collect()
    }
}

/// One row of the instance table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSummary {
    #[serde(rename = "Folder Name")]
    pub folder_name: String,
    #[serde(rename = "Instance Name")]
    pub instance_name: String,
    #[serde(rename = "Number of Customers")]
    pub num_customers: usize,
    #[serde(rename = "Number of Items")]
    pub num_items: usize,
    #[serde(rename = "Number of Item Types")]
    pub num_item_types: usize,
    #[serde(rename = "Number of Vehicles")]
    pub num_vehicles: usize,
    #[serde(rename = "Time Windows")]
    pub time_windows: u32,
    #[serde(rename = "Vehicle Capacity")]
    pub vehicle_capacity: f64,
    #[serde(rename = "Cargo Length")]
    pub cargo_length: f64,
    #[serde(rename = "Cargo Width")]
    pub cargo_width: f64,
    #[serde(rename = "Cargo Height")]
    pub cargo_height: f64,
    // The trailing space is part of the published column name.
    #[serde(rename = "Cargo Volume ")]
    pub cargo_volume: f64,
    #[serde(rename = "Vehicle LB Volume")]
    pub lb_volume: f64,
    #[serde(rename = "Vehicle LB Mass")]
    pub lb_mass: f64,
    #[serde(rename = "Vehicle Coverage Mass")]
    pub coverage_mass: f64,
    #[serde(rename = "Vehicle Coverage Volume")]
    pub coverage_volume: f64,
}

impl InstanceSummary {
    pub fn vehicle(&self) -> Vehicle {
        Vehicle::new(self.vehicle_capacity, self.cargo_length, self.cargo_width, self.cargo_height)
    }
}

/// Standardized geometry of one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedItem {
    #[serde(rename = "Type")]
    pub item_type: String,
    #[serde(rename = "Length_standardized")]
    pub length: f64,
    #[serde(rename = "Width_standardized")]
    pub width: f64,
    #[serde(rename = "Height_standardized")]
    pub height: f64,
    #[serde(rename = "Mass_standardized")]
    pub mass: f64,
    #[serde(rename = "Volume_standardized")]
    pub volume: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance.sqrt())
}

fn z_score(value: f64, (mean, std): (f64, f64)) -> f64 {
    (value - mean) / std
}
