//! Client for the restaurant lookup backend: pick a city, then a zipcode,
//! list the restaurants there and open one's menu.

pub mod api;
pub mod config;
pub mod controller;
pub mod data;
pub mod error;
pub mod page;
pub mod sanitize;
pub mod state;
pub mod table;
