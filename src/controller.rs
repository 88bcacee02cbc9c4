use tracing::{debug, error, info, warn};

use crate::{
    api::Backend,
    config::ClientConfig,
    data::{
        CityList, MenuQuery, MenuRow, RestaurantColumns, RestaurantRow, TablePayload, ZipcodeList,
    },
    error::ClientError,
    page::{Notice, Page},
    state::{RequestKind, RequestTracker, Selection, Ticket},
    table::{SortDirection, TableId, TableOptions, TableOptionsBuilder, TableWidget},
};

/// What happened to a response once it came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Superseded by a newer request or a different selection; dropped.
    Stale,
    /// Shown to the user in the banner.
    Failed,
}

/// Drives the page: every user action and every response goes through here.
///
/// Network operations come in halves. `begin_*` issues a [`Ticket`], the
/// backend call is awaited, and `finish_*` applies the response only while the
/// ticket is still current, so a slow answer for an old selection never
/// overwrites a newer one.
pub struct Controller<B> {
    backend: B,
    config: ClientConfig,
    selection: Selection,
    tracker: RequestTracker,
    page: Page,
}

impl<B: Backend> Controller<B> {
    pub fn new(backend: B, config: ClientConfig) -> Self {
        Self {
            backend,
            config,
            selection: Selection::default(),
            tracker: RequestTracker::default(),
            page: Page::default(),
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn table_mut(&mut self, id: TableId) -> Option<&mut TableWidget> {
        self.page.tables.get_mut(id)
    }

    /// Items of the open menu in display order.
    pub fn menu_items(&self) -> Vec<MenuRow> {
        self.page
            .tables
            .get(TableId::Menu)
            .map(|widget| MenuRow::collect(widget.columns(), widget.ordered_rows()))
            .unwrap_or_default()
    }

    fn fail(&mut self, err: ClientError) -> Outcome {
        error!("{err}");
        self.page.banner = Some(Notice {
            message: err.to_string(),
        });
        Outcome::Failed
    }

    fn applied(&mut self) -> Outcome {
        self.page.banner = None;
        Outcome::Applied
    }

    fn is_stale(&self, ticket: &Ticket) -> bool {
        let stale = !self.tracker.is_current(ticket, &self.selection);
        if stale {
            debug!(
                "discarding {:?} response #{} issued under {:?}",
                ticket.kind, ticket.generation, ticket.selection
            );
        }
        stale
    }

    pub fn begin_cities(&mut self) -> Ticket {
        self.tracker.issue(RequestKind::Cities, &self.selection)
    }

    pub fn finish_cities(&mut self, ticket: Ticket, result: Result<CityList, ClientError>) -> Outcome {
        if self.is_stale(&ticket) {
            return Outcome::Stale;
        }
        match result {
            Ok(list) => {
                self.page.cities.reset();
                for city in listed("cities", list.num_cities, list.cities) {
                    self.page.cities.append(city);
                }
                self.applied()
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn load_cities(&mut self) -> Outcome {
        let ticket = self.begin_cities();
        let result = self.backend.cities().await;
        self.finish_cities(ticket, result)
    }

    /// The synchronous half of a city pick: moves the selection and clears the
    /// zipcode dropdown back to its placeholder.
    pub fn select_city(&mut self, city: &str) -> Result<(), ClientError> {
        if !self.page.cities.select(city) {
            return Err(ClientError::UnknownOption {
                selector: "city",
                value: city.to_string(),
            });
        }
        self.selection.select_city(city);
        self.page.zipcodes.reset();
        Ok(())
    }

    pub async fn on_city_selected(&mut self, city: &str) -> Outcome {
        if let Err(e) = self.select_city(city) {
            return self.fail(e);
        }
        self.load_zipcodes(city).await
    }

    pub fn begin_zipcodes(&mut self, city: &str) -> Ticket {
        info!("loading zipcodes of {city}");
        self.tracker.issue(RequestKind::Zipcodes, &self.selection)
    }

    pub fn finish_zipcodes(
        &mut self,
        ticket: Ticket,
        result: Result<ZipcodeList, ClientError>,
    ) -> Outcome {
        if self.is_stale(&ticket) {
            return Outcome::Stale;
        }
        match result {
            Ok(list) => {
                for zipcode in listed("zipcodes", list.num_zipcodes, list.zipcodes) {
                    self.page.zipcodes.append(zipcode);
                }
                self.applied()
            }
            Err(e) => self.fail(e),
        }
    }

    pub async fn load_zipcodes(&mut self, city: &str) -> Outcome {
        let ticket = self.begin_zipcodes(city);
        let result = self.backend.zipcodes(city).await;
        self.finish_zipcodes(ticket, result)
    }

    /// Picking a zipcode only records it; the search is a separate action.
    pub fn on_zipcode_selected(&mut self, zipcode: &str) -> Outcome {
        if self.selection.city().is_none() {
            return self.fail(ClientError::MissingSelection("city"));
        }
        if !self.page.zipcodes.select(zipcode) {
            return self.fail(ClientError::UnknownOption {
                selector: "zipcode",
                value: zipcode.to_string(),
            });
        }
        match self.selection.select_zipcode(zipcode) {
            Ok(()) => self.applied(),
            Err(e) => self.fail(e),
        }
    }

    pub async fn trigger_restaurant_search(&mut self) -> Outcome {
        let Some(city) = self.selection.city().map(str::to_string) else {
            return self.fail(ClientError::MissingSelection("city"));
        };
        let Some(zipcode) = self.selection.zipcode().map(str::to_string) else {
            return self.fail(ClientError::MissingSelection("zipcode"));
        };
        self.load_restaurants(&city, &zipcode).await
    }

    pub fn begin_restaurants(&mut self, city: &str, zipcode: &str) -> Ticket {
        info!("searching restaurants in {city} {zipcode}");
        self.tracker.issue(RequestKind::Restaurants, &self.selection)
    }

    pub fn finish_restaurants(
        &mut self,
        ticket: Ticket,
        result: Result<TablePayload, ClientError>,
    ) -> Outcome {
        self.finish_table(TableId::Restnames, ticket, result)
    }

    pub async fn load_restaurants(&mut self, city: &str, zipcode: &str) -> Outcome {
        let ticket = self.begin_restaurants(city, zipcode);
        let result = self.backend.restaurants(city, zipcode).await;
        self.finish_restaurants(ticket, result)
    }

    pub fn begin_menu(&mut self, row: &RestaurantRow) -> (Ticket, MenuQuery) {
        info!("opening menu of {} ({})", row.name, row.business_id);
        let ticket = self.tracker.issue(RequestKind::Menu, &self.selection);
        (ticket, row.menu_query())
    }

    pub fn finish_menu(&mut self, ticket: Ticket, result: Result<TablePayload, ClientError>) -> Outcome {
        self.finish_table(TableId::Menu, ticket, result)
    }

    pub async fn load_menu(&mut self, row: &RestaurantRow) -> Outcome {
        let (ticket, query) = self.begin_menu(row);
        let result = self.backend.menu(&query).await;
        self.finish_menu(ticket, result)
    }

    fn finish_table(
        &mut self,
        id: TableId,
        ticket: Ticket,
        result: Result<TablePayload, ClientError>,
    ) -> Outcome {
        if self.is_stale(&ticket) {
            return Outcome::Stale;
        }
        match result.and_then(|payload| self.render_table(id, payload)) {
            Ok(()) => self.applied(),
            Err(e) => self.fail(e),
        }
    }

    /// Replaces the table under `id` with a fresh widget for `payload`.
    pub fn render_table(&mut self, id: TableId, payload: TablePayload) -> Result<(), ClientError> {
        let options = self.table_options(id)?;
        match self.page.tables.destroy(id) {
            Ok(_) => debug!("destroyed {}", id.container()),
            Err(e) => debug!("nothing to destroy: {e}"),
        }
        let widget = self.page.tables.create(id, payload, options)?;
        info!("rendered {} with {} rows", id.container(), widget.len());
        Ok(())
    }

    fn table_options(&self, id: TableId) -> Result<TableOptions, ClientError> {
        let order_column = match id {
            TableId::Restnames => self.config.restaurant_sort_column,
            TableId::Menu => self.config.menu_sort_column,
        };
        TableOptionsBuilder::default()
            .order_column(order_column)
            .order_direction(SortDirection::Descending)
            .paging(true)
            .page_length(self.config.page_length)
            .filter(false)
            .info(false)
            .hidden_columns(vec![0])
            .build()
            .map_err(|e| ClientError::Options(e.to_string()))
    }

    /// Click on the restaurant row at `position` (0-based) of the current page.
    pub async fn on_restaurant_row_click(&mut self, position: usize) -> Outcome {
        match self.clicked_row(position) {
            Ok(row) => self.load_menu(&row).await,
            Err(e) => self.fail(e),
        }
    }

    fn clicked_row(&mut self, position: usize) -> Result<RestaurantRow, ClientError> {
        let widget = self
            .page
            .tables
            .get_mut(TableId::Restnames)
            .ok_or(ClientError::TableNotFound(TableId::Restnames.as_str()))?;
        let columns = RestaurantColumns::resolve(widget.columns());
        let (_, cells) = widget
            .row_at(position)
            .ok_or(ClientError::RowOutOfRange(position))?;
        let row = RestaurantRow::from_cells(columns, cells)?;
        widget.select(position)?;
        Ok(row)
    }
}

fn listed(what: &str, expected: usize, mut items: Vec<String>) -> Vec<String> {
    if expected != items.len() {
        warn!("server announced {expected} {what} but sent {}", items.len());
    }
    items.truncate(expected);
    items
}
