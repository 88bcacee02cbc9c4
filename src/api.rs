use async_trait::async_trait;
use reqwest::{multipart::Form, Client, Response};
use tracing::{info, warn};

use crate::{
    config::ClientConfig,
    data::{CityList, MenuQuery, TablePayload, ZipcodeList},
    error::ClientError,
    sanitize::decode_table,
};

pub const CITIES: &str = "/getcities";
pub const ZIPCODES: &str = "/getzipcodes";
pub const RESTAURANTS: &str = "/getrestnames";
pub const MENU: &str = "/getmenu";

/// The four lookups the browser needs from the server.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn cities(&self) -> Result<CityList, ClientError>;

    async fn zipcodes(&self, city: &str) -> Result<ZipcodeList, ClientError>;

    async fn restaurants(&self, city: &str, zipcode: &str) -> Result<TablePayload, ClientError>;

    async fn menu(&self, query: &MenuQuery) -> Result<TablePayload, ClientError>;
}

pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_base_url(config.base_url())
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    async fn post(&self, endpoint: &'static str, fields: &[(&str, &str)]) -> Result<String, ClientError> {
        let form = fields.iter().fold(Form::new(), |form, (name, value)| {
            form.text(name.to_string(), value.to_string())
        });

        info!("POST {endpoint} {fields:?}");
        let res = self.client.post(self.url(endpoint)).multipart(form).send().await?;
        body_of(res).await
    }
}

async fn body_of(res: Response) -> Result<String, ClientError> {
    let status = res.status();
    if !status.is_success() {
        return Err(ClientError::Status(status.as_u16()));
    }
    Ok(res.text().await?)
}

fn ensure_ok(endpoint: &'static str, status: &str) -> Result<(), ClientError> {
    if status == "OK" {
        Ok(())
    } else {
        warn!("{endpoint} answered with status {status}");
        Err(ClientError::NotOk {
            endpoint,
            status: status.to_string(),
        })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn cities(&self) -> Result<CityList, ClientError> {
        info!("GET {CITIES}");
        let res = self.client.get(self.url(CITIES)).send().await?;
        let list: CityList = serde_json::from_str(&body_of(res).await?)?;
        ensure_ok(CITIES, &list.status)?;
        Ok(list)
    }

    async fn zipcodes(&self, city: &str) -> Result<ZipcodeList, ClientError> {
        let body = self.post(ZIPCODES, &[("city", city)]).await?;
        let list: ZipcodeList = serde_json::from_str(&body)?;
        ensure_ok(ZIPCODES, &list.status)?;
        Ok(list)
    }

    async fn restaurants(&self, city: &str, zipcode: &str) -> Result<TablePayload, ClientError> {
        let body = self
            .post(RESTAURANTS, &[("city", city), ("zipcode", zipcode)])
            .await?;
        decode_table(RESTAURANTS, &body)
    }

    async fn menu(&self, query: &MenuQuery) -> Result<TablePayload, ClientError> {
        let body = self
            .post(
                MENU,
                &[
                    ("zipcode", query.zipcode.as_str()),
                    ("city", query.city.as_str()),
                    ("business_id", query.business_id.as_str()),
                ],
            )
            .await?;
        decode_table(MENU, &body)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use actix_web::{web, App, HttpResponse, HttpServer};
    use serde_json::Value;

    use super::*;

    type Seen = Arc<Mutex<Vec<(String, Vec<(String, String)>)>>>;

    fn form_fields(body: &[u8]) -> Vec<(String, String)> {
        let text = String::from_utf8_lossy(body);
        text.split("name=\"")
            .skip(1)
            .filter_map(|part| {
                let (name, rest) = part.split_once('"')?;
                let (_, value) = rest.split_once("\r\n\r\n")?;
                let value = value.split("\r\n").next()?;
                Some((name.to_string(), value.to_string()))
            })
            .collect()
    }

    fn record(seen: &Seen, endpoint: &str, body: &[u8]) {
        seen.lock()
            .unwrap()
            .push((endpoint.to_string(), form_fields(body)));
    }

    async fn cities() -> HttpResponse {
        HttpResponse::Ok().json(serde_json::json!({
            "status": "OK",
            "num_cities": 2,
            "cities": ["Austin", "Denver"]
        }))
    }

    async fn zipcodes(seen: web::Data<Seen>, body: web::Bytes) -> HttpResponse {
        record(&seen, ZIPCODES, &body);
        HttpResponse::Ok().json(serde_json::json!({
            "status": "OK",
            "num_zipcodes": 2,
            "zipcodes": [80202, 80203]
        }))
    }

    async fn restaurants(seen: web::Data<Seen>, body: web::Bytes) -> HttpResponse {
        record(&seen, RESTAURANTS, &body);
        HttpResponse::Ok().content_type("application/json").body(
            r#"{"coldefs": [{"title": "business_id"}, {"title": "name"}, {"title": "zipcode"},
                {"title": "city"}, {"title": "rating"}, {"title": "num_reviews"}],
                "data": [["b-1", "Snooze", 80202, "Denver", NaN, 12]]}"#,
        )
    }

    async fn menu(seen: web::Data<Seen>, body: web::Bytes) -> HttpResponse {
        record(&seen, MENU, &body);
        HttpResponse::InternalServerError().finish()
    }

    async fn serve(seen: Seen) -> String {
        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(seen.clone()))
                .route(CITIES, web::get().to(cities))
                .route(ZIPCODES, web::post().to(zipcodes))
                .route(RESTAURANTS, web::post().to(restaurants))
                .route(MENU, web::post().to(menu))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        format!("http://{addr}")
    }

    #[actix_web::test]
    async fn talks_to_the_four_endpoints() {
        let seen = Seen::default();
        let backend = HttpBackend::with_base_url(serve(seen.clone()).await);

        let cities = backend.cities().await.unwrap();
        assert_eq!(cities.cities, vec!["Austin", "Denver"]);

        let zipcodes = backend.zipcodes("Denver").await.unwrap();
        assert_eq!(zipcodes.zipcodes, vec!["80202", "80203"]);

        let payload = backend.restaurants("Denver", "80202").await.unwrap();
        assert_eq!(payload.data[0][4], Value::Null);
        assert_eq!(payload.coldefs.len(), 6);

        let query = MenuQuery {
            business_id: "b-1".into(),
            zipcode: "80202".into(),
            city: "Denver".into(),
        };
        let err = backend.menu(&query).await.unwrap_err();
        assert!(matches!(err, ClientError::Status(500)));

        let seen = seen.lock().unwrap();
        let field = |name: &str, value: &str| (name.to_string(), value.to_string());
        assert_eq!(
            *seen,
            vec![
                (ZIPCODES.to_string(), vec![field("city", "Denver")]),
                (
                    RESTAURANTS.to_string(),
                    vec![field("city", "Denver"), field("zipcode", "80202")]
                ),
                (
                    MENU.to_string(),
                    vec![
                        field("zipcode", "80202"),
                        field("city", "Denver"),
                        field("business_id", "b-1")
                    ]
                ),
            ]
        );
    }

    #[actix_web::test]
    async fn unreachable_server_is_a_transport_error() {
        let backend = HttpBackend::with_base_url("http://127.0.0.1:9");
        let err = backend.cities().await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[test]
    fn non_ok_status_is_an_error() {
        assert!(ensure_ok(CITIES, "OK").is_ok());
        let err = ensure_ok(CITIES, "ERROR").unwrap_err();
        assert_eq!(err.to_string(), "/getcities answered with status \"ERROR\"");
    }
}
