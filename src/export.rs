//! Writers for sampled routes: JSON documents and fixed-width text files.

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::Customer;
use crate::sampler::{SampledRoute, DEPOT_ID};
use crate::tables::InstanceView;

/// Field naming of the nodes in JSON documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeStyle {
    /// All customer columns; items carry their volume
    #[default]
    Full,
    /// `ID`, `X`, `Y` and `Demand` (the demanded mass); items without volume
    Compact,
}

/// Output artifact kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json(NodeStyle),
    Text,
}

impl ExportFormat {
    pub fn exporter(self) -> Box<dyn RouteExporter> {
        match self {
            ExportFormat::Json(style) => Box::new(JsonExporter::new(style)),
            ExportFormat::Text => Box::new(TextExporter),
        }
    }
}

/// Writes one artifact per route into a directory.
pub trait RouteExporter {
    /// File extension without the dot.
    fn extension(&self) -> &'static str;

    /// Write the artifact named `name` for the nodes of `route`.
    fn write(
        &self,
        view: &InstanceView<'_>,
        name: &str,
        route: &[usize],
        writer: &mut dyn Write,
    ) -> Result<()>;

    /// Write a sampled route to `dir/{instance}_{count}_{index}.{ext}`.
    fn write_route(
        &self,
        view: &InstanceView<'_>,
        route: &SampledRoute,
        dir: &Path,
    ) -> Result<PathBuf> {
        let name = route.file_stem(view.name());
        self.write_file(view, &name, &route.route, dir)
    }

    /// Write the whole instance (depot, then every customer) to `dir/{instance}.{ext}`.
    fn write_transform(&self, view: &InstanceView<'_>, dir: &Path) -> Result<PathBuf> {
        let route: Vec<usize> = (DEPOT_ID..=view.num_customers()).collect();
        self.write_file(view, view.name(), &route, dir)
    }

    fn write_file(
        &self,
        view: &InstanceView<'_>,
        name: &str,
        route: &[usize],
        dir: &Path,
    ) -> Result<PathBuf> {
        let path = dir.join(format!("{}.{}", name, self.extension()));
        let mut writer = BufWriter::new(File::create(&path)?);
        self.write(view, name, route, &mut writer)?;
        writer.flush()?;
        Ok(path)
    }
}

/// One vehicle of a JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRecord {
    #[serde(rename = "Capacity")]
    pub capacity: i64,
    #[serde(rename = "Length")]
    pub length: i64,
    #[serde(rename = "Width")]
    pub width: i64,
    #[serde(rename = "Height")]
    pub height: i64,
}

/// `EnableHorizontalRotation` is written as `1` by the full style and `true` by the compact one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RotationFlag {
    Int(u8),
    Bool(bool),
}

/// One demanded item of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(rename = "Quantity")]
    pub quantity: u32,
    #[serde(rename = "Weight")]
    pub weight: f64,
    #[serde(rename = "Length")]
    pub length: i64,
    #[serde(rename = "Width")]
    pub width: i64,
    #[serde(rename = "Height")]
    pub height: i64,
    #[serde(rename = "Volume", skip_serializing_if = "Option::is_none", default)]
    pub volume: Option<i64>,
    #[serde(rename = "Fragility")]
    pub fragility: String,
    #[serde(rename = "EnableHorizontalRotation")]
    pub enable_horizontal_rotation: RotationFlag,
    #[serde(rename = "Rotated")]
    pub rotated: String,
}

/// A node in the full style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullNode {
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
    #[serde(rename = "Items")]
    pub items: Vec<ItemRecord>,
}

/// A node in the compact style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactNode {
    #[serde(rename = "ID")]
    pub id: usize,
    #[serde(rename = "X")]
    pub x: i64,
    #[serde(rename = "Y")]
    pub y: i64,
    #[serde(rename = "Demand")]
    pub demand: f64,
    #[serde(rename = "Items")]
    pub items: Vec<ItemRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeRecord {
    Full(FullNode),
    Compact(CompactNode),
}

/// The JSON document of one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDocument {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Vehicles")]
    pub vehicles: Vec<VehicleRecord>,
    #[serde(rename = "Nodes")]
    pub nodes: Vec<NodeRecord>,
}

/// Writes routes as JSON documents indented by four spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExporter {
    pub style: NodeStyle,
}

impl JsonExporter {
    pub fn new(style: NodeStyle) -> Self {
        JsonExporter { style }
    }

    /// Resolve the nodes of `route` and their demanded items.
    pub fn document(
        &self,
        view: &InstanceView<'_>,
        name: &str,
        route: &[usize],
    ) -> Result<RouteDocument> {
        let vehicle = view.vehicle();
        let vehicles = (0..view.num_vehicles())
            .map(|_| VehicleRecord {
                capacity: vehicle.mass_capacity as i64,
                length: vehicle.cargo_length as i64,
                width: vehicle.cargo_width as i64,
                height: vehicle.cargo_height as i64,
            })
            .collect();

        let nodes = route
            .iter()
            .map(|&id| {
                let customer = view.node(id)?;
                Ok(self.node(customer, self.items_of(view, id)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RouteDocument {
            name: name.to_string(),
            vehicles,
            nodes,
        })
    }

    fn node(&self, customer: &Customer, items: Vec<ItemRecord>) -> NodeRecord {
        match self.style {
            NodeStyle::Full => NodeRecord::Full(FullNode {
                customer_id: customer.customer_id,
                x: customer.x,
                y: customer.y,
                demand: customer.demand,
                ready_time: customer.ready_time,
                due_date: customer.due_date,
                service_time: customer.service_time,
                demanded_mass: customer.demanded_mass,
                demanded_volume: customer.demanded_volume,
                items,
            }),
            NodeStyle::Compact => NodeRecord::Compact(CompactNode {
                id: customer.customer_id,
                x: customer.x,
                y: customer.y,
                demand: customer.demanded_mass,
                items,
            }),
        }
    }

    /// One record per demand row whose item type is known, in file order.
    fn items_of(&self, view: &InstanceView<'_>, customer_id: usize) -> Vec<ItemRecord> {
        view.demands_of(customer_id)
            .filter_map(|demand| {
                let item = view.item(&demand.item_type)?;
                Some(ItemRecord {
                    quantity: demand.quantity,
                    weight: item.mass,
                    length: item.length as i64,
                    width: item.width as i64,
                    height: item.height as i64,
                    volume: match self.style {
                        NodeStyle::Full => Some(item.volume as i64),
                        NodeStyle::Compact => None,
                    },
                    fragility: if item.is_fragile() { "Fragile" } else { "None" }.to_string(),
                    enable_horizontal_rotation: match self.style {
                        NodeStyle::Full => RotationFlag::Int(1),
                        NodeStyle::Compact => RotationFlag::Bool(true),
                    },
                    rotated: "None".to_string(),
                })
            })
            .collect()
    }
}

impl RouteExporter for JsonExporter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn write(
        &self,
        view: &InstanceView<'_>,
        name: &str,
        route: &[usize],
        writer: &mut dyn Write,
    ) -> Result<()> {
        let document = self.document(view, name, route)?;
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
        document.serialize(&mut serializer)?;
        Ok(())
    }
}

/// Writes routes as a fixed-width header, an item table and the route demands.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExporter;

impl TextExporter {
    /// Render the text artifact of `route` into a string.
    pub fn render(&self, view: &InstanceView<'_>, name: &str, route: &[usize]) -> Result<String> {
        let mut buffer = Vec::new();
        self.write(view, name, route, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl RouteExporter for TextExporter {
    fn extension(&self) -> &'static str {
        "txt"
    }

    fn write(
        &self,
        view: &InstanceView<'_>,
        name: &str,
        route: &[usize],
        writer: &mut dyn Write,
    ) -> Result<()> {
        let vehicle = view.vehicle();
        let customers = route.iter().filter(|&&id| id != DEPOT_ID).count();
        let total_items: u32 = route
            .iter()
            .flat_map(|&id| view.demands_of(id))
            .map(|demand| demand.quantity)
            .sum();

        let header: [(&str, String); 9] = [
            ("Name", name.to_string()),
            ("Number_of_Customers", customers.to_string()),
            ("Number_of_Items", total_items.to_string()),
            ("Number_of_ItemTypes", view.items.len().to_string()),
            ("Number_of_Vehicles", view.num_vehicles().to_string()),
            ("Mass_Capacity", vehicle.mass_capacity.to_string()),
            ("CargoSpace_Length", vehicle.cargo_length.to_string()),
            ("CargoSpace_Width", vehicle.cargo_width.to_string()),
            ("CargoSpace_Height", vehicle.cargo_height.to_string()),
        ];
        for (key, value) in header.iter() {
            writeln!(writer, "{:<30}{:>10}", key, value)?;
        }

        writeln!(writer)?;
        writeln!(writer, "ITEMS")?;
        writeln!(writer, "Type\tLength\tWidth\tHeight\tMass\tFragility")?;
        for item in &view.items {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}\t{}",
                item.item_type, item.length, item.width, item.height, item.mass, item.fragility
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "ROUTE and DEMAND")?;
        for &id in route {
            let node = view.node(id)?;
            write!(writer, "{}", node.customer_id)?;
            for demand in view.demands_of(id) {
                write!(writer, "\t{}\t{}", demand.item_type, demand.quantity)?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }
}

/// Create `dir` and its parents if needed.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}
