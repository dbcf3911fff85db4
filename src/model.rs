//! Flat records for items, customers, demands and aggregated demands.
//!
//! Every record carries the folder and instance it was read from so that rows of
//! many instances can live in one table. The serde field names are the column
//! names of the CSV exchange tables and must not change.

use serde::{Deserialize, Serialize};

/// Cargo space and mass capacity of the (homogeneous) vehicle of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vehicle {
    pub mass_capacity: f64,
    pub cargo_length: f64,
    pub cargo_width: f64,
    pub cargo_height: f64,
}

impl Vehicle {
    /// Create a new vehicle description.
    pub fn new(mass_capacity: f64, cargo_length: f64, cargo_width: f64, cargo_height: f64) -> Self {
        Vehicle {
            mass_capacity,
            cargo_length,
            cargo_width,
            cargo_height,
        }
    }

    /// Volume of the cargo space.
    pub fn cargo_volume(&self) -> f64 {
        self.cargo_length * self.cargo_width * self.cargo_height
    }

    /// True once capacity and every cargo dimension are positive.
    pub fn is_complete(&self) -> bool {
        self.mass_capacity > 0.0
            && self.cargo_length > 0.0
            && self.cargo_width > 0.0
            && self.cargo_height > 0.0
    }
}

/// An item type that customers can demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "Folder Name")]
    pub folder_name: String,
    #[serde(rename = "Instance Name")]
    pub instance_name: String,
    #[serde(rename = "Type")]
    pub item_type: String,
    #[serde(rename = "Length")]
    pub length: f64,
    #[serde(rename = "Width")]
    pub width: f64,
    #[serde(rename = "Height")]
    pub height: f64,
    #[serde(rename = "Mass")]
    pub mass: f64,
    #[serde(rename = "Fragility")]
    pub fragility: u8,
    #[serde(rename = "Volume")]
    pub volume: f64,
    #[serde(rename = "Relative Width")]
    pub relative_width: f64,
    #[serde(rename = "Relative Height")]
    pub relative_height: f64,
    #[serde(rename = "Relative Length")]
    pub relative_length: f64,
    #[serde(rename = "Relative Mass")]
    pub relative_mass: f64,
    #[serde(rename = "Relative Volume")]
    pub relative_volume: f64,
}

impl Item {
    /// Create an item and recompute its volume and its metrics relative to `vehicle`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        folder_name: &str,
        instance_name: &str,
        item_type: &str,
        length: f64,
        width: f64,
        height: f64,
        mass: f64,
        fragility: u8,
        vehicle: &Vehicle,
    ) -> Self {
        let volume = length * width * height;
        Item {
            folder_name: folder_name.to_string(),
            instance_name: instance_name.to_string(),
            item_type: item_type.to_string(),
            length,
            width,
            height,
            mass,
            fragility,
            volume,
            relative_width: width / vehicle.cargo_width,
            relative_height: height / vehicle.cargo_height,
            relative_length: length / vehicle.cargo_length,
            relative_mass: mass / vehicle.mass_capacity,
            relative_volume: volume / vehicle.cargo_volume(),
        }
    }

    pub fn is_fragile(&self) -> bool {
        self.fragility == 1
    }
}

/// A node of the instance: its location, time window and demanded load.
///
/// Id 0 is the depot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "Folder Name")]
    pub folder_name: String,
    #[serde(rename = "Instance Name")]
    pub instance_name: String,
    #[serde(rename = "Customer ID")]
    pub customer_id: usize,
    pub x: i64,
    pub y: i64,
    #[serde(rename = "Demand")]
    pub demand: f64,
    #[serde(rename = "Ready Time")]
    pub ready_time: i64,
    #[serde(rename = "Due Date")]
    pub due_date: i64,
    #[serde(rename = "Service Time")]
    pub service_time: i64,
    #[serde(rename = "Demanded Mass")]
    pub demanded_mass: f64,
    #[serde(rename = "Demanded Volume")]
    pub demanded_volume: f64,
}

impl Customer {
    pub fn is_depot(&self) -> bool {
        self.customer_id == 0
    }
}

/// One (customer, item type, quantity) demand line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    #[serde(rename = "Folder Name")]
    pub folder_name: String,
    #[serde(rename = "Instance Name")]
    pub instance_name: String,
    #[serde(rename = "Customer ID")]
    pub customer_id: usize,
    #[serde(rename = "Type")]
    pub item_type: String,
    #[serde(rename = "Quantity")]
    pub quantity: u32,
}

impl Demand {
    /// Create a new demand row.
    pub fn new(
        folder_name: &str,
        instance_name: &str,
        customer_id: usize,
        item_type: &str,
        quantity: u32,
    ) -> Self {
        Demand {
            folder_name: folder_name.to_string(),
            instance_name: instance_name.to_string(),
            customer_id,
            item_type: item_type.to_string(),
            quantity,
        }
    }
}

/// Totals of all demand rows of one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateDemand {
    #[serde(rename = "Folder Name")]
    pub folder_name: String,
    #[serde(rename = "Instance Name")]
    pub instance_name: String,
    #[serde(rename = "Customer ID")]
    pub customer_id: usize,
    #[serde(rename = "Agg Quantity")]
    pub quantity: u32,
    #[serde(rename = "Agg Mass")]
    pub mass: f64,
    #[serde(rename = "Agg Volume")]
    pub volume: f64,
    #[serde(rename = "Agg Volume Ratio")]
    pub volume_ratio: f64,
    #[serde(rename = "Agg Mass Ratio")]
    pub mass_ratio: f64,
}

impl AggregateDemand {
    /// Sum up `demands` of one customer, resolving item types in `items`.
    ///
    /// Returns the offending type when a demand references an unknown item.
    pub fn from_demands<'a>(
        folder_name: &str,
        instance_name: &str,
        customer_id: usize,
        demands: impl IntoIterator<Item = &'a Demand>,
        items: &[Item],
        vehicle: &Vehicle,
    ) -> Result<Self, String> {
        let mut quantity = 0;
        let mut mass = 0.0;
        let mut volume = 0.0;

        for demand in demands {
            let item = items
                .iter()
                .find(|item| item.item_type == demand.item_type)
                .ok_or_else(|| demand.item_type.clone())?;
            quantity += demand.quantity;
            mass += item.mass * demand.quantity as f64;
            volume += item.volume * demand.quantity as f64;
        }

        Ok(AggregateDemand {
            folder_name: folder_name.to_string(),
            instance_name: instance_name.to_string(),
            customer_id,
            quantity,
            mass,
            volume,
            volume_ratio: volume / vehicle.cargo_volume(),
            mass_ratio: mass / vehicle.mass_capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_derived_fields_follow_geometry() {
        let vehicle = Vehicle::new(100.0, 10.0, 4.0, 5.0);
        let item = Item::new("F", "I", "A", 2.0, 2.0, 1.0, 25.0, 1, &vehicle);

        assert_eq!(item.volume, 4.0);
        assert_eq!(item.relative_length, 0.2);
        assert_eq!(item.relative_width, 0.5);
        assert_eq!(item.relative_height, 0.2);
        assert_eq!(item.relative_mass, 0.25);
        assert_eq!(item.relative_volume, 4.0 / 200.0);
        assert!(item.is_fragile());
    }

    #[test]
    fn aggregate_of_no_demands_is_zero() {
        let vehicle = Vehicle::new(100.0, 10.0, 4.0, 5.0);
        let agg =
            AggregateDemand::from_demands("F", "I", 3, std::iter::empty(), &[], &vehicle).unwrap();

        assert_eq!(agg.quantity, 0);
        assert_eq!(agg.mass, 0.0);
        assert_eq!(agg.volume, 0.0);
    }

    #[test]
    fn aggregate_rejects_unknown_item_type() {
        let vehicle = Vehicle::new(100.0, 10.0, 4.0, 5.0);
        let demand = Demand::new("F", "I", 1, "Z", 2);

        assert_eq!(
            AggregateDemand::from_demands("F", "I", 1, [&demand], &[], &vehicle),
            Err("Z".to_string())
        );
    }
}
