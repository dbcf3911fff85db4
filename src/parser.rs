//! Reader for the sectioned 3L-CVRP benchmark text format.
//!
//! A file is a sequence of header lines (`Name`, `Number_of_Customers`, ...) and
//! sections introduced by a marker line (`VEHICLE`, `CUSTOMERS`, `ITEMS`,
//! `DEMANDS PER CUSTOMER`). The line right after the `CUSTOMERS`, `ITEMS` and
//! `DEMANDS PER CUSTOMER` markers holds column titles and is skipped.
//!
//! ```text
//! Name                  E016-03m
//! Number_of_Customers   15
//! Number_of_Vehicles    4
//! VEHICLE
//! Mass_Capacity         90
//! CargoSpace_Length     60
//! ...
//! ITEMS
//! Type  Length  Width  Height  Mass  Fragility
//! Bx1   20      10     15      12    0
//! ```

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::dataset::{folder_name_of, unit_divider};
use crate::error::{Error, Result};
use crate::instance::{Instance, InstanceHeader};
use crate::model::{AggregateDemand, Customer, Demand, Item, Vehicle};

/// Keyword lines recognised by the parser, in matching priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Name,
    NumberOfCustomers,
    NumberOfItems,
    NumberOfItemTypes,
    NumberOfVehicles,
    TimeWindows,
    Vehicle,
    Customers,
    Items,
    Demands,
}

impl Marker {
    pub const PRIORITY: [Marker; 10] = [
        Marker::Name,
        Marker::NumberOfCustomers,
        Marker::NumberOfItems,
        Marker::NumberOfItemTypes,
        Marker::NumberOfVehicles,
        Marker::TimeWindows,
        Marker::Vehicle,
        Marker::Customers,
        Marker::Items,
        Marker::Demands,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Marker::Name => "Name",
            Marker::NumberOfCustomers => "Number_of_Customers",
            Marker::NumberOfItems => "Number_of_Items",
            Marker::NumberOfItemTypes => "Number_of_ItemTypes",
            Marker::NumberOfVehicles => "Number_of_Vehicles",
            Marker::TimeWindows => "TimeWindows",
            Marker::Vehicle => "VEHICLE",
            Marker::Customers => "CUSTOMERS",
            Marker::Items => "ITEMS",
            Marker::Demands => "DEMANDS PER CUSTOMER",
        }
    }

    /// The section this marker opens, if it is a section marker.
    fn section(self) -> Option<ParserState> {
        match self {
            Marker::Vehicle => Some(ParserState::Vehicle),
            Marker::Customers => Some(ParserState::Customers),
            Marker::Items => Some(ParserState::Items),
            Marker::Demands => Some(ParserState::Demands),
            _ => None,
        }
    }
}

/// How marker keywords are found in a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MarkerMatching {
    /// The first keyword contained anywhere in the line wins.
    Substring,
    /// The keyword must open the line, followed by whitespace, `:` or the line end.
    #[default]
    LeadingToken,
}

/// Options controlling how instance files are read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserOptions {
    pub matching: MarkerMatching,
}

impl ParserOptions {
    pub fn new() -> Self {
        ParserOptions::default()
    }

    /// Set the keyword matching mode.
    pub fn with_matching(mut self, matching: MarkerMatching) -> Self {
        self.matching = matching;
        self
    }
}

/// A classified input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Line<'a> {
    Blank,
    Marker(Marker, Vec<&'a str>),
    Data(Vec<&'a str>),
}

/// Classify one raw line.
pub fn classify(line: &str, matching: MarkerMatching) -> Line<'_> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Line::Blank;
    }

    let found = Marker::PRIORITY.iter().copied().find(|marker| {
        let keyword = marker.keyword();
        match matching {
            MarkerMatching::Substring => line.contains(keyword),
            MarkerMatching::LeadingToken => line
                .trim_start()
                .strip_prefix(keyword)
                .map_or(false, |rest| {
                    rest.is_empty() || rest.starts_with(|c: char| c.is_whitespace() || c == ':')
                }),
        }
    });

    match found {
        Some(marker) => Line::Marker(marker, tokens),
        None => Line::Data(tokens),
    }
}

/// Section the parser is currently reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    None,
    Vehicle,
    Customers,
    Items,
    Demands,
}

/// Line-by-line builder of an [`Instance`].
pub struct InstanceParser {
    path: PathBuf,
    folder_name: String,
    divider: f64,
    options: ParserOptions,
    state: ParserState,
    skip_header: bool,
    line_no: usize,

    name: Option<String>,
    num_customers: usize,
    num_items: usize,
    num_item_types: usize,
    num_vehicles: usize,
    time_windows: u32,
    vehicle: Vehicle,

    depot: Option<Customer>,
    customers: Vec<Customer>,
    items: Vec<Item>,
    demands: Vec<Demand>,
    aggregate_demands: Vec<AggregateDemand>,
}

impl InstanceParser {
    /// Create a parser for the file at `path`.
    ///
    /// The unit divider is chosen from the name of the folder containing `path`.
    pub fn new(path: impl AsRef<Path>, options: ParserOptions) -> Self {
        let path = path.as_ref().to_path_buf();
        let folder_name = folder_name_of(&path);
        let divider = unit_divider(&folder_name);

        InstanceParser {
            path,
            folder_name,
            divider,
            options,
            state: ParserState::None,
            skip_header: false,
            line_no: 0,
            name: None,
            num_customers: 0,
            num_items: 0,
            num_item_types: 0,
            num_vehicles: 0,
            time_windows: 0,
            vehicle: Vehicle::default(),
            depot: None,
            customers: Vec::new(),
            items: Vec::new(),
            demands: Vec::new(),
            aggregate_demands: Vec::new(),
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Parse a complete file content.
    pub fn parse_str(mut self, content: &str) -> Result<Instance> {
        for line in content.lines() {
            self.feed(line)?;
        }
        self.finish()
    }

    /// Consume the next line of the file.
    pub fn feed(&mut self, line: &str) -> Result<()> {
        self.line_no += 1;

        match classify(line, self.options.matching) {
            Line::Blank => Ok(()),
            Line::Marker(marker, tokens) => self.on_marker(marker, &tokens),
            Line::Data(_) if self.skip_header => {
                trace!("{:?}: skipping column header at line {}", self.path, self.line_no);
                self.skip_header = false;
                Ok(())
            }
            Line::Data(tokens) => match self.state {
                ParserState::None => {
                    trace!(
                        "{:?}: ignoring line {} outside of any section",
                        self.path,
                        self.line_no
                    );
                    Ok(())
                }
                ParserState::Vehicle => self.on_vehicle_line(&tokens),
                ParserState::Customers => self.on_customer_line(&tokens),
                ParserState::Items => self.on_item_line(&tokens),
                ParserState::Demands => self.on_demand_line(&tokens),
            },
        }
    }

    /// Validate what was read and build the instance.
    pub fn finish(self) -> Result<Instance> {
        let name = self
            .name
            .ok_or_else(|| Error::malformed(&self.path, 0, "missing Name"))?;
        if self.num_vehicles == 0 {
            return Err(Error::malformed(&self.path, 0, "missing or zero Number_of_Vehicles"));
        }
        if !self.vehicle.is_complete() {
            return Err(Error::malformed(
                &self.path,
                0,
                "VEHICLE section missing or without positive capacity and cargo dimensions",
            ));
        }
        if !self.customers.is_empty() && self.customers.len() != self.num_customers {
            debug!(
                "{}: header announces {} customers, {} were listed",
                name,
                self.num_customers,
                self.customers.len()
            );
        }

        let header = InstanceHeader {
            folder_name: self.folder_name,
            name,
            num_customers: self.num_customers,
            num_items: self.num_items,
            num_item_types: self.num_item_types,
            num_vehicles: self.num_vehicles,
            time_windows: self.time_windows,
            vehicle: self.vehicle,
            divider: self.divider,
        };

        Ok(Instance::new(
            header,
            self.depot,
            self.customers,
            self.items,
            self.demands,
            self.aggregate_demands,
        ))
    }

    fn on_marker(&mut self, marker: Marker, tokens: &[&str]) -> Result<()> {
        if let Some(section) = marker.section() {
            debug!("{:?}: entering {:?} at line {}", self.path, section, self.line_no);
            self.state = section;
            self.skip_header = section != ParserState::Vehicle;
            return Ok(());
        }

        let value = tokens
            .iter()
            .skip(1)
            .find(|token| **token != ":")
            .copied()
            .ok_or_else(|| self.error(format!("{} without value", marker.keyword())))?;

        match marker {
            Marker::Name => self.name = Some(value.to_string()),
            Marker::NumberOfCustomers => {
                self.num_customers = self.number(value, "Number_of_Customers")?
            }
            Marker::NumberOfItems => self.num_items = self.number(value, "Number_of_Items")?,
            Marker::NumberOfItemTypes => {
                self.num_item_types = self.number(value, "Number_of_ItemTypes")?
            }
            Marker::NumberOfVehicles => {
                self.num_vehicles = self.number(value, "Number_of_Vehicles")?
            }
            Marker::TimeWindows => self.time_windows = self.number(value, "TimeWindows")?,
            _ => unreachable!("section markers are handled above"),
        }
        Ok(())
    }

    fn on_vehicle_line(&mut self, tokens: &[&str]) -> Result<()> {
        let key = tokens[0];
        if key.contains("Mass_Capacity") {
            self.vehicle.mass_capacity = self.field(tokens, 1, "Mass_Capacity")?;
        } else if key.contains("CargoSpace_Length") {
            self.vehicle.cargo_length =
                self.field::<f64>(tokens, 1, "CargoSpace_Length")? / self.divider;
        } else if key.contains("CargoSpace_Width") {
            self.vehicle.cargo_width =
                self.field::<f64>(tokens, 1, "CargoSpace_Width")? / self.divider;
        } else if key.contains("CargoSpace_Height") {
            self.vehicle.cargo_height =
                self.field::<f64>(tokens, 1, "CargoSpace_Height")? / self.divider;
        }
        Ok(())
    }

    fn on_customer_line(&mut self, tokens: &[&str]) -> Result<()> {
        if tokens.len() < 9 {
            return Err(self.error(format!("customer line needs 9 fields, found {}", tokens.len())));
        }

        let customer = Customer {
            folder_name: self.folder_name.clone(),
            instance_name: self.instance_name(),
            customer_id: self.field(tokens, 0, "customer id")?,
            x: self.integer(tokens, 1, "x")?,
            y: self.integer(tokens, 2, "y")?,
            demand: self.field(tokens, 3, "demand")?,
            ready_time: self.integer(tokens, 4, "ready time")?,
            due_date: self.integer(tokens, 5, "due date")?,
            service_time: self.integer(tokens, 6, "service time")?,
            demanded_mass: self.field(tokens, 7, "demanded mass")?,
            demanded_volume: self.field(tokens, 8, "demanded volume")?,
        };

        if customer.is_depot() {
            self.depot = Some(customer);
        } else {
            self.customers.push(customer);
        }
        Ok(())
    }

    fn on_item_line(&mut self, tokens: &[&str]) -> Result<()> {
        if !self.vehicle.is_complete() {
            return Err(self.error("ITEMS section appears before a complete VEHICLE section"));
        }
        if tokens.len() < 6 {
            return Err(self.error(format!("item line needs 6 fields, found {}", tokens.len())));
        }

        let fragility: u8 = self.field(tokens, 5, "fragility")?;
        if fragility > 1 {
            return Err(self.error(format!("fragility must be 0 or 1, found {}", fragility)));
        }

        let item = Item::new(
            &self.folder_name,
            &self.instance_name(),
            tokens[0],
            self.field::<f64>(tokens, 1, "length")? / self.divider,
            self.field::<f64>(tokens, 2, "width")? / self.divider,
            self.field::<f64>(tokens, 3, "height")? / self.divider,
            self.field(tokens, 4, "mass")?,
            fragility,
            &self.vehicle,
        );
        self.items.push(item);
        Ok(())
    }

    fn on_demand_line(&mut self, tokens: &[&str]) -> Result<()> {
        if !self.vehicle.is_complete() {
            return Err(self.error("DEMANDS section appears before a complete VEHICLE section"));
        }
        if tokens.len() % 2 == 0 {
            return Err(self.error(
                "demand line must be a customer id followed by (type, quantity) pairs",
            ));
        }

        let customer_id: usize = self.field(tokens, 0, "customer id")?;
        let instance_name = self.instance_name();
        let first = self.demands.len();

        for pair in tokens[1..].chunks(2) {
            let quantity = self.number(pair[1], "quantity")?;
            self.demands.push(Demand::new(
                &self.folder_name,
                &instance_name,
                customer_id,
                pair[0],
                quantity,
            ));
        }

        let aggregate = AggregateDemand::from_demands(
            &self.folder_name,
            &instance_name,
            customer_id,
            &self.demands[first..],
            &self.items,
            &self.vehicle,
        )
        .map_err(|item_type| {
            self.error(format!("demand references unknown item type {}", item_type))
        })?;
        self.aggregate_demands.push(aggregate);
        Ok(())
    }

    fn instance_name(&self) -> String {
        self.name.clone().unwrap_or_default()
    }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::malformed(&self.path, self.line_no, reason)
    }

    fn number<T: FromStr>(&self, value: &str, what: &str) -> Result<T> {
        value
            .parse()
            .map_err(|_| self.error(format!("invalid {}: {:?}", what, value)))
    }

    fn field<T: FromStr>(&self, tokens: &[&str], index: usize, what: &str) -> Result<T> {
        let value = tokens
            .get(index)
            .ok_or_else(|| self.error(format!("missing {}", what)))?;
        self.number(value, what)
    }

    /// Integer column that some files write with a trailing `.0`.
    fn integer(&self, tokens: &[&str], index: usize, what: &str) -> Result<i64> {
        let value: f64 = self.field(tokens, index, what)?;
        if value.fract() != 0.0 {
            return Err(self.error(format!("{} must be an integer, found {}", what, value)));
        }
        Ok(value as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_blank_and_data() {
        assert_eq!(classify("   ", MarkerMatching::LeadingToken), Line::Blank);
        assert_eq!(
            classify("1 20 30", MarkerMatching::LeadingToken),
            Line::Data(vec!["1", "20", "30"])
        );
    }

    #[test]
    fn classify_prefers_earlier_keyword_in_substring_mode() {
        // "Name" is tested before "ITEMS".
        let line = "ITEMS Name";
        assert!(matches!(
            classify(line, MarkerMatching::Substring),
            Line::Marker(Marker::Name, _)
        ));
        assert!(matches!(
            classify(line, MarkerMatching::LeadingToken),
            Line::Marker(Marker::Items, _)
        ));
    }

    #[test]
    fn leading_token_requires_word_boundary() {
        assert!(matches!(
            classify("Number_of_ItemTypes 3", MarkerMatching::LeadingToken),
            Line::Marker(Marker::NumberOfItemTypes, _)
        ));
        assert!(matches!(
            classify("Number_of_Items 12", MarkerMatching::LeadingToken),
            Line::Marker(Marker::NumberOfItems, _)
        ));
        assert!(matches!(
            classify("Name: E016", MarkerMatching::LeadingToken),
            Line::Marker(Marker::Name, _)
        ));
        assert!(matches!(
            classify("Names 1 2", MarkerMatching::LeadingToken),
            Line::Data(_)
        ));
    }

    #[test]
    fn header_row_skipped_only_after_non_vehicle_sections() {
        let mut parser = InstanceParser::new("Data/Test/t.txt", ParserOptions::new());
        parser.feed("VEHICLE").unwrap();
        assert_eq!(parser.state(), ParserState::Vehicle);
        parser.feed("Mass_Capacity 100").unwrap();
        assert_eq!(parser.vehicle.mass_capacity, 100.0);

        parser.feed("CUSTOMERS").unwrap();
        assert!(parser.skip_header);
        parser.feed("").unwrap();
        assert!(parser.skip_header);
        parser.feed("Node X Y").unwrap();
        assert!(!parser.skip_header);
    }
}
