use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CityList {
    pub status: String,
    pub num_cities: usize,
    #[serde(default)]
    pub cities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ZipcodeList {
    pub status: String,
    pub num_zipcodes: usize,
    /// The zipcode column is numeric on the server, so both forms show up.
    #[serde(default, deserialize_with = "strings_or_numbers")]
    pub zipcodes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub title: String,
}

impl ColumnDef {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

#[derive(Deserialize)]
struct PlainColumnDef {
    #[serde(default)]
    title: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawColumnDef {
    Plain(PlainColumnDef),
    // the menu endpoint wraps its dummy first column in a one-element array
    Wrapped(Vec<PlainColumnDef>),
}

impl<'de> Deserialize<'de> for ColumnDef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let title = match RawColumnDef::deserialize(deserializer)? {
            RawColumnDef::Plain(def) => def.title,
            RawColumnDef::Wrapped(defs) => defs.into_iter().next().map(|d| d.title).unwrap_or_default(),
        };
        Ok(ColumnDef { title })
    }
}

/// Tabular payload of `/getrestnames` and `/getmenu`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TablePayload {
    pub data: Vec<Vec<Value>>,
    pub coldefs: Vec<ColumnDef>,
}

fn column_of(coldefs: &[ColumnDef], title: &str, fallback: usize) -> usize {
    coldefs
        .iter()
        .position(|c| c.title == title)
        .unwrap_or(fallback)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantRow {
    pub business_id: String,
    pub name: String,
    pub zipcode: String,
    pub city: String,
    pub rating: Option<f64>,
    pub num_reviews: Option<u64>,
}

/// Column indices of a restaurant table, resolved by title first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestaurantColumns {
    business_id: usize,
    name: usize,
    zipcode: usize,
    city: usize,
    rating: usize,
    num_reviews: usize,
}

impl RestaurantColumns {
    pub fn resolve(coldefs: &[ColumnDef]) -> Self {
        let at = |title, fallback| column_of(coldefs, title, fallback);
        Self {
            business_id: at("business_id", 0),
            name: at("name", 1),
            zipcode: at("zipcode", 2),
            city: at("city", 3),
            rating: at("rating", 4),
            num_reviews: at("num_reviews", 5),
        }
    }
}

impl RestaurantRow {
    pub fn from_cells(columns: RestaurantColumns, cells: &[Value]) -> Result<Self, ClientError> {
        let required = |index: usize, field: &str| {
            cells
                .get(index)
                .and_then(cell_text)
                .ok_or_else(|| ClientError::RowShape(format!("missing {field} in column {index}")))
        };

        Ok(Self {
            business_id: required(columns.business_id, "business_id")?,
            name: cells.get(columns.name).and_then(cell_text).unwrap_or_default(),
            zipcode: required(columns.zipcode, "zipcode")?,
            city: required(columns.city, "city")?,
            rating: cells.get(columns.rating).and_then(Value::as_f64),
            num_reviews: cells.get(columns.num_reviews).and_then(Value::as_u64),
        })
    }

    pub fn menu_query(&self) -> MenuQuery {
        MenuQuery {
            business_id: self.business_id.clone(),
            zipcode: self.zipcode.clone(),
            city: self.city.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuRow {
    pub item: String,
    pub count: Option<u64>,
}

impl MenuRow {
    /// Named view of menu table rows; rows without an item name are skipped.
    pub fn collect<'a>(
        coldefs: &[ColumnDef],
        rows: impl IntoIterator<Item = &'a [Value]>,
    ) -> Vec<MenuRow> {
        let item = column_of(coldefs, "menu", 1);
        let count = column_of(coldefs, "count", 2);
        rows.into_iter()
            .filter_map(|cells| {
                Some(MenuRow {
                    item: cells.get(item).and_then(cell_text)?,
                    count: cells.get(count).and_then(Value::as_u64),
                })
            })
            .collect()
    }
}

/// Form body of `/getmenu`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuQuery {
    pub business_id: String,
    pub zipcode: String,
    pub city: String,
}

/// Text of a scalar cell; `None` for null and nested values.
pub fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn strings_or_numbers<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let values = Vec::<Value>::deserialize(deserializer)?;
    values
        .iter()
        .map(|v| {
            cell_text(v).ok_or_else(|| serde::de::Error::custom(format!("unexpected zipcode {v}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_zipcodes_become_strings() {
        let list: ZipcodeList = serde_json::from_value(json!({
            "status": "OK",
            "num_zipcodes": 2,
            "zipcodes": [80202, "80203"]
        }))
        .unwrap();
        assert_eq!(list.zipcodes, vec!["80202", "80203"]);
    }

    #[test]
    fn wrapped_dummy_column_is_accepted() {
        let payload: TablePayload = serde_json::from_value(json!({
            "coldefs": [[{"title": "dummy"}], {"title": "menu"}, {"title": "count"}],
            "data": [[0, "tacos", 12], [0, "burrito", 3]]
        }))
        .unwrap();

        assert_eq!(payload.coldefs[0], ColumnDef::new("dummy"));
        assert_eq!(
            MenuRow::collect(&payload.coldefs, payload.data.iter().map(Vec::as_slice)),
            vec![
                MenuRow {
                    item: "tacos".into(),
                    count: Some(12)
                },
                MenuRow {
                    item: "burrito".into(),
                    count: Some(3)
                },
            ]
        );
    }

    #[test]
    fn restaurant_fields_follow_column_titles() {
        let coldefs = ["city", "zipcode", "name", "business_id"].map(ColumnDef::new);
        let columns = RestaurantColumns::resolve(&coldefs);
        let row = RestaurantRow::from_cells(
            columns,
            &[json!("Denver"), json!(80202), json!("Snooze"), json!("b-17")],
        )
        .unwrap();

        assert_eq!(row.business_id, "b-17");
        assert_eq!(row.zipcode, "80202");
        assert_eq!(row.city, "Denver");
        assert_eq!(row.name, "Snooze");
        assert_eq!(row.rating, None);
    }

    #[test]
    fn positional_fallback_without_titles() {
        let columns = RestaurantColumns::resolve(&[]);
        let row = RestaurantRow::from_cells(
            columns,
            &[
                json!("b-1"),
                json!("Vinny's"),
                json!("80203"),
                json!("Denver"),
                json!(4.5),
                json!(120),
            ],
        )
        .unwrap();
        assert_eq!(
            row.menu_query(),
            MenuQuery {
                business_id: "b-1".into(),
                zipcode: "80203".into(),
                city: "Denver".into(),
            }
        );
        assert_eq!(row.rating, Some(4.5));
        assert_eq!(row.num_reviews, Some(120));
    }

    #[test]
    fn missing_identifier_is_rejected() {
        let columns = RestaurantColumns::resolve(&[]);
        let err = RestaurantRow::from_cells(columns, &[Value::Null, json!("x"), json!("1")])
            .unwrap_err();
        assert!(matches!(err, ClientError::RowShape(_)));
    }
}
