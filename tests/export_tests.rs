//! Tests for the JSON and text route artifacts.

use cvrp3l_gen::error::Error;
use cvrp3l_gen::export::{JsonExporter, TextExporter};
use cvrp3l_gen::parser::{InstanceParser, ParserOptions};
use cvrp3l_gen::{ExportFormat, InstanceTables, NodeStyle, RouteExporter, SampledRoute};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

/// Builds tables holding one instance with three customers.
fn create_test_tables() -> InstanceTables {
    let text = "\
Name T01
Number_of_Customers 3
Number_of_Items 6
Number_of_ItemTypes 2
Number_of_Vehicles 2
VEHICLE
Mass_Capacity 100
CargoSpace_Length 10
CargoSpace_Width 10
CargoSpace_Height 10
CUSTOMERS
Node X Y Demand ReadyTime DueDate Service DemandedMass DemandedVolume
0 0 0 0 0 1000 0 0 0
1 10 0 30 0 1000 10 30 200
2 0 10 40 0 1000 10 40 300
3 10 10 20 0 1000 10 20 100
ITEMS
Type Length Width Height Mass Fragility
Bx1 10 5 2 10 0
Bx2 5 5 4 20 1
DEMANDS PER CUSTOMER
Customer Type Quantity
1 Bx1 1 Bx2 1
2 Bx1 2 Bx2 1
3 Bx2 1
";
    let instance = InstanceParser::new("Data/Test/T01.txt", ParserOptions::new())
        .parse_str(text)
        .unwrap();

    let mut tables = InstanceTables::new();
    tables.push(&instance);
    tables
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "cvrp3l_gen_export_{}_{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn to_json(style: NodeStyle, route: &[usize]) -> Value {
    let tables = create_test_tables();
    let view = tables.view("T01").unwrap();
    let document = JsonExporter::new(style).document(&view, "T01_2_0", route).unwrap();
    serde_json::to_value(document).unwrap()
}

#[test]
fn test_full_style_document() {
    let json = to_json(NodeStyle::Full, &[0, 1, 3]);

    assert_eq!(json["Name"], "T01_2_0");
    assert_eq!(json["Vehicles"].as_array().unwrap().len(), 2);
    assert_eq!(json["Vehicles"][0]["Capacity"], 100);
    assert_eq!(json["Vehicles"][0]["Length"], 10);

    let nodes = json["Nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0]["Customer ID"], 0);
    assert_eq!(nodes[0]["Items"].as_array().unwrap().len(), 0);
    assert_eq!(nodes[1]["Customer ID"], 1);
    assert_eq!(nodes[1]["x"], 10);
    assert_eq!(nodes[1]["Demand"].as_f64(), Some(30.0));
    assert_eq!(nodes[1]["Due Date"], 1000);
    assert!(nodes[1].get("Folder Name").is_none());

    let items = nodes[1]["Items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["Quantity"], 1);
    assert_eq!(items[0]["Weight"].as_f64(), Some(10.0));
    assert_eq!(items[0]["Length"], 10);
    assert_eq!(items[0]["Volume"], 100);
    assert_eq!(items[0]["Fragility"], "None");
    assert_eq!(items[0]["EnableHorizontalRotation"], 1);
    assert_eq!(items[0]["Rotated"], "None");
    assert_eq!(items[1]["Fragility"], "Fragile");
}

#[test]
fn test_compact_style_document() {
    let json = to_json(NodeStyle::Compact, &[0, 2]);

    let nodes = json["Nodes"].as_array().unwrap();
    assert_eq!(nodes[1]["ID"], 2);
    assert_eq!(nodes[1]["X"], 0);
    assert_eq!(nodes[1]["Y"], 10);
    assert_eq!(nodes[1]["Demand"].as_f64(), Some(40.0));
    assert!(nodes[1].get("Customer ID").is_none());

    let item = &nodes[1]["Items"][0];
    assert_eq!(item["Quantity"], 2);
    assert!(item.get("Volume").is_none());
    assert_eq!(item["EnableHorizontalRotation"], true);
}

#[test]
fn test_unknown_node_is_a_lookup_error() {
    let tables = create_test_tables();
    let view = tables.view("T01").unwrap();

    let result = JsonExporter::default().document(&view, "T01_2_0", &[0, 7]);
    assert!(matches!(result, Err(Error::Lookup(_))));
}

#[test]
fn test_write_route_uses_file_stem() {
    let tables = create_test_tables();
    let view = tables.view("T01").unwrap();
    let dir = temp_dir("route");
    let route = SampledRoute {
        customer_count: 2,
        index: 7,
        route: vec![0, 3, 1],
    };

    let exporter = ExportFormat::Json(NodeStyle::Full).exporter();
    let path = exporter.write_route(&view, &route, &dir).unwrap();
    assert_eq!(path, dir.join("T01_2_7.json"));

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("{\n    \"Name\": \"T01_2_7\""));

    let json: Value = serde_json::from_str(&content).unwrap();
    let ids: Vec<_> = json["Nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["Customer ID"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![0, 3, 1]);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_transform_writes_whole_instance() {
    let tables = create_test_tables();
    let view = tables.view("T01").unwrap();
    let dir = temp_dir("transform");

    let exporter = ExportFormat::Json(NodeStyle::Compact).exporter();
    let path = exporter.write_transform(&view, &dir).unwrap();
    assert_eq!(path, dir.join("T01.json"));

    let json: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(json["Name"], "T01");
    assert_eq!(json["Nodes"].as_array().unwrap().len(), 4);
    assert_eq!(json["Nodes"][0]["ID"], 0);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_text_layout() {
    let tables = create_test_tables();
    let view = tables.view("T01").unwrap();

    let text = TextExporter.render(&view, "T01_2_0", &[0, 2, 1]).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines[0], format!("{:<30}{:>10}", "Name", "T01_2_0"));
    assert_eq!(lines[1], format!("{:<30}{:>10}", "Number_of_Customers", 2));
    assert_eq!(lines[2], format!("{:<30}{:>10}", "Number_of_Items", 5));
    assert_eq!(lines[3], format!("{:<30}{:>10}", "Number_of_ItemTypes", 2));
    assert_eq!(lines[4], format!("{:<30}{:>10}", "Number_of_Vehicles", 2));
    assert_eq!(lines[5], format!("{:<30}{:>10}", "Mass_Capacity", 100));
    assert_eq!(lines[9], "");
    assert_eq!(lines[10], "ITEMS");
    assert_eq!(lines[12], "Bx1\t10\t5\t2\t10\t0");
    assert_eq!(lines[14], "");
    assert_eq!(lines[15], "ROUTE and DEMAND");
    assert_eq!(lines[16], "0");
    assert_eq!(lines[17], "2\tBx1\t2\tBx2\t1");
    assert_eq!(lines[18], "1\tBx1\t1\tBx2\t1");
    assert_eq!(lines.len(), 19);
}

#[test]
fn test_text_exporter_writes_txt_file() {
    let tables = create_test_tables();
    let view = tables.view("T01").unwrap();
    let dir = temp_dir("text");

    let path = TextExporter.write_file(&view, "T01_3_0", &[0, 1, 2, 3], &dir).unwrap();
    assert_eq!(path, dir.join("T01_3_0.txt"));
    assert!(fs::read_to_string(&path).unwrap().contains("ROUTE and DEMAND"));

    fs::remove_dir_all(&dir).unwrap();
}
