//! Merged tables of many instances and their CSV exchange format.

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::instance::{Instance, InstanceSummary};
use crate::model::{AggregateDemand, Customer, Demand, Item, Vehicle};

/// Rows of any number of instances, one table per record kind.
#[derive(Debug, Clone, Default)]
pub struct InstanceTables {
    pub instances: Vec<InstanceSummary>,
    pub items: Vec<Item>,
    pub demands: Vec<Demand>,
    pub aggregate_demands: Vec<AggregateDemand>,
    /// All nodes, depot rows included
    pub customers: Vec<Customer>,
}

impl InstanceTables {
    pub fn new() -> Self {
        InstanceTables::default()
    }

    /// Append all rows of `instance`.
    pub fn push(&mut self, instance: &Instance) {
        self.instances.push(instance.summary());
        self.items.extend(instance.items.iter().cloned());
        self.demands.extend(instance.demands.iter().cloned());
        self.aggregate_demands
            .extend(instance.aggregate_demands.iter().cloned());
        self.customers.extend(instance.depot.iter().cloned());
        self.customers.extend(instance.customers.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Names of all instances, in insertion order.
    pub fn instance_names(&self) -> impl Iterator<Item = &str> {
        self.instances.iter().map(|row| row.instance_name.as_str())
    }

    /// Read-only rows of the instance called `name`.
    pub fn view(&self, name: &str) -> Result<InstanceView<'_>> {
        let summary = self
            .instances
            .iter()
            .find(|row| row.instance_name == name)
            .ok_or_else(|| Error::Lookup(format!("no instance named {}", name)))?;

        Ok(InstanceView {
            summary,
            items: self.items.iter().filter(|r| r.instance_name == name).collect(),
            demands: self.demands.iter().filter(|r| r.instance_name == name).collect(),
            aggregate_demands: self
                .aggregate_demands
                .iter()
                .filter(|r| r.instance_name == name)
                .collect(),
            customers: self.customers.iter().filter(|r| r.instance_name == name).collect(),
        })
    }

    /// Write the five tables as `{prefix}_*.csv` files into `dir`.
    pub fn write_csv<P: AsRef<Path>>(&self, dir: P, prefix: &str) -> Result<()> {
        let dir = dir.as_ref();
        write_table(&table_path(dir, prefix, INSTANCE_TABLE), &self.instances)?;
        write_table(&table_path(dir, prefix, AGG_DEMAND_TABLE), &self.aggregate_demands)?;
        write_table(&table_path(dir, prefix, DEMAND_TABLE), &self.demands)?;
        write_table(&table_path(dir, prefix, ITEM_TABLE), &self.items)?;
        write_table(&table_path(dir, prefix, CUSTOMER_TABLE), &self.customers)?;
        info!(
            "Wrote tables of {} instances to {:?} with prefix {}",
            self.instances.len(),
            dir,
            prefix
        );
        Ok(())
    }

    /// Read tables previously written by [`InstanceTables::write_csv`].
    pub fn read_csv<P: AsRef<Path>>(dir: P, prefix: &str) -> Result<Self> {
        let dir = dir.as_ref();
        Ok(InstanceTables {
            instances: read_table(&table_path(dir, prefix, INSTANCE_TABLE))?,
            aggregate_demands: read_table(&table_path(dir, prefix, AGG_DEMAND_TABLE))?,
            demands: read_table(&table_path(dir, prefix, DEMAND_TABLE))?,
            items: read_table(&table_path(dir, prefix, ITEM_TABLE))?,
            customers: read_table(&table_path(dir, prefix, CUSTOMER_TABLE))?,
        })
    }
}

impl Extend<Instance> for InstanceTables {
    fn extend<T: IntoIterator<Item = Instance>>(&mut self, iter: T) {
        for instance in iter {
            self.push(&instance);
        }
    }
}

const INSTANCE_TABLE: &str = "instance_data";
const AGG_DEMAND_TABLE: &str = "agg_demand";
const DEMAND_TABLE: &str = "single_demands";
const ITEM_TABLE: &str = "items";
const CUSTOMER_TABLE: &str = "customers";

/// Path of one CSV table, e.g. `dir/gendreau_items.csv`.
pub fn table_path(dir: &Path, prefix: &str, table: &str) -> PathBuf {
    dir.join(format!("{}_{}.csv", prefix, table))
}

fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    debug!("Wrote {} rows to {:?}", rows.len(), path);
    Ok(())
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize().collect::<std::result::Result<Vec<T>, _>>()?;
    debug!("Read {} rows from {:?}", rows.len(), path);
    Ok(rows)
}

/// Rows of a single instance borrowed from [`InstanceTables`].
#[derive(Debug, Clone)]
pub struct InstanceView<'a> {
    pub summary: &'a InstanceSummary,
    pub items: Vec<&'a Item>,
    pub demands: Vec<&'a Demand>,
    pub aggregate_demands: Vec<&'a AggregateDemand>,
    pub customers: Vec<&'a Customer>,
}

impl<'a> InstanceView<'a> {
    pub fn name(&self) -> &'a str {
        &self.summary.instance_name
    }

    pub fn vehicle(&self) -> Vehicle {
        self.summary.vehicle()
    }

    pub fn num_customers(&self) -> usize {
        self.summary.num_customers
    }

    pub fn num_vehicles(&self) -> usize {
        self.summary.num_vehicles
    }

    /// The node row with `customer_id`; id 0 is the depot.
    pub fn node(&self, customer_id: usize) -> Result<&'a Customer> {
        self.customers
            .iter()
            .copied()
            .find(|c| c.customer_id == customer_id)
            .ok_or_else(|| {
                Error::Lookup(format!("no customer {} in instance {}", customer_id, self.name()))
            })
    }

    /// Demand rows of one customer, in file order.
    pub fn demands_of(&self, customer_id: usize) -> impl Iterator<Item = &'a Demand> + '_ {
        self.demands
            .iter()
            .copied()
            .filter(move |d| d.customer_id == customer_id)
    }

    /// First item of the given type.
    pub fn item(&self, item_type: &str) -> Option<&'a Item> {
        self.items.iter().copied().find(|item| item.item_type == item_type)
    }
}

/// Upper bound on the number of customers a route may hold, and the customer count.
///
/// The bound divides the customer count by the vehicle lower bounds, each taken
/// at least as one vehicle.
pub fn calculate_bounds(summary: &InstanceSummary) -> (usize, usize) {
    let max_customers = summary.num_customers;
    let volume_lb = summary.lb_volume.max(1.0);
    let mass_lb = summary.lb_mass.max(1.0);

    let by_volume = (max_customers as f64 / volume_lb).ceil();
    let by_mass = (max_customers as f64 / mass_lb).ceil();

    (by_volume.max(by_mass) as usize, max_customers)
}
