use std::collections::HashMap;

use crate::error::ClientError;

/// What the user has picked so far. Re-picking a city always drops the zipcode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    NoCity,
    CitySelected {
        city: String,
    },
    CityAndZipcodeSelected {
        city: String,
        zipcode: String,
    },
}

impl Selection {
    pub fn select_city(&mut self, city: impl Into<String>) {
        *self = Selection::CitySelected { city: city.into() };
    }

    pub fn select_zipcode(&mut self, zipcode: impl Into<String>) -> Result<(), ClientError> {
        let city = self
            .city()
            .ok_or(ClientError::MissingSelection("city"))?
            .to_string();
        *self = Selection::CityAndZipcodeSelected {
            city,
            zipcode: zipcode.into(),
        };
        Ok(())
    }

    pub fn city(&self) -> Option<&str> {
        match self {
            Selection::NoCity => None,
            Selection::CitySelected { city } | Selection::CityAndZipcodeSelected { city, .. } => {
                Some(city)
            }
        }
    }

    pub fn zipcode(&self) -> Option<&str> {
        match self {
            Selection::CityAndZipcodeSelected { zipcode, .. } => Some(zipcode),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Cities,
    Zipcodes,
    Restaurants,
    Menu,
}

/// Identifies one in-flight request and the selection it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub kind: RequestKind,
    pub generation: u64,
    pub selection: Selection,
}

/// Hands out tickets and decides whether a response still belongs on screen.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: HashMap<RequestKind, u64>,
}

impl RequestTracker {
    pub fn issue(&mut self, kind: RequestKind, selection: &Selection) -> Ticket {
        let generation = self.latest.entry(kind).or_default();
        *generation += 1;
        Ticket {
            kind,
            generation: *generation,
            selection: selection.clone(),
        }
    }

    /// A ticket is current while it is the newest of its kind and the part of
    /// the selection its response depends on has not moved.
    pub fn is_current(&self, ticket: &Ticket, selection: &Selection) -> bool {
        if self.latest.get(&ticket.kind) != Some(&ticket.generation) {
            return false;
        }

        match ticket.kind {
            RequestKind::Cities | RequestKind::Menu => true,
            RequestKind::Zipcodes => selection.city() == ticket.selection.city(),
            RequestKind::Restaurants => *selection == ticket.selection,
        }
    }
}
