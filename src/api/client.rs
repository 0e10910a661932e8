use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::auth::AuthInfo;
use crate::database::models::{
    AdminUpdateUser, BookingDetail, BookingFilter, ClientDetail, CreateAvailability, CreateBooking, CreateClient,
    CreateField, CreatePet, CreateService, CreateSite, CreateStaff, CreateVehicle, Field, Pet, Profile, Service,
    ServiceAvailability, Site, StaffMember, UpdateBooking, UpdateClient, UpdateField, UpdatePet, UpdateProfile,
    UpdateService, UpdateSite, UpdateStaff, UpdateVehicle, Vehicle,
};
use crate::services::availability::Slot;

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("{status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl ApiClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Typed client for the daycare HTTP API, shared by the CLI and any Rust
/// front end
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiClientError> {
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(base_url)?,
            token: None,
        })
    }

    /// Authenticate requests with a bearer access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiClientError> {
        let url = self.base_url.join(path)?;
        let builder = self.http.request(method, url);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiClientError> {
        let response = check(builder.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_empty(builder: RequestBuilder) -> Result<(), ApiClientError> {
        check(builder.send().await?).await?;
        Ok(())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiClientError> {
        Self::send(self.request(Method::GET, path)?).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiClientError> {
        Self::send(self.request(Method::POST, path)?.json(body)).await
    }

    pub async fn patch_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiClientError> {
        Self::send(self.request(Method::PATCH, path)?.json(body)).await
    }

    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiClientError> {
        Self::send(self.request(Method::PUT, path)?.json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiClientError> {
        Self::send_empty(self.request(Method::DELETE, path)?).await
    }

    // Public

    pub async fn health(&self) -> Result<Value, ApiClientError> {
        self.get_json("/health").await
    }

    // Auth and profile

    pub async fn me(&self) -> Result<AuthInfo, ApiClientError> {
        self.get_json("/api/auth/me").await
    }

    pub async fn update_password(&self, password: &str) -> Result<(), ApiClientError> {
        let builder = self.request(Method::POST, "/api/auth/password")?;
        Self::send_empty(builder.json(&json!({ "password": password }))).await
    }

    pub async fn logout(&self) -> Result<(), ApiClientError> {
        Self::send_empty(self.request(Method::POST, "/api/auth/logout")?).await
    }

    pub async fn profile(&self) -> Result<Profile, ApiClientError> {
        self.get_json("/api/profile").await
    }

    pub async fn update_profile(&self, req: &UpdateProfile) -> Result<Profile, ApiClientError> {
        self.put_json("/api/profile", req).await
    }

    // Sites and fields

    pub async fn sites(&self) -> Result<Vec<Site>, ApiClientError> {
        self.get_json("/api/sites").await
    }

    pub async fn site(&self, id: Uuid) -> Result<Site, ApiClientError> {
        self.get_json(&format!("/api/sites/{}", id)).await
    }

    pub async fn create_site(&self, req: &CreateSite) -> Result<Site, ApiClientError> {
        self.post_json("/api/sites", req).await
    }

    pub async fn update_site(&self, id: Uuid, req: &UpdateSite) -> Result<Site, ApiClientError> {
        self.patch_json(&format!("/api/sites/{}", id), req).await
    }

    pub async fn delete_site(&self, id: Uuid) -> Result<(), ApiClientError> {
        self.delete(&format!("/api/sites/{}", id)).await
    }

    pub async fn fields(&self, site_id: Option<Uuid>) -> Result<Vec<Field>, ApiClientError> {
        match site_id {
            Some(site_id) => self.get_json(&format!("/api/fields?site_id={}", site_id)).await,
            None => self.get_json("/api/fields").await,
        }
    }

    pub async fn field(&self, id: Uuid) -> Result<Field, ApiClientError> {
        self.get_json(&format!("/api/fields/{}", id)).await
    }

    pub async fn create_field(&self, req: &CreateField) -> Result<Field, ApiClientError> {
        self.post_json("/api/fields", req).await
    }

    pub async fn update_field(&self, id: Uuid, req: &UpdateField) -> Result<Field, ApiClientError> {
        self.patch_json(&format!("/api/fields/{}", id), req).await
    }

    pub async fn delete_field(&self, id: Uuid) -> Result<(), ApiClientError> {
        self.delete(&format!("/api/fields/{}", id)).await
    }

    // Services, availability and slots

    pub async fn services(&self) -> Result<Vec<Service>, ApiClientError> {
        self.get_json("/api/services").await
    }

    pub async fn service(&self, id: Uuid) -> Result<Service, ApiClientError> {
        self.get_json(&format!("/api/services/{}", id)).await
    }

    pub async fn create_service(&self, req: &CreateService) -> Result<Service, ApiClientError> {
        self.post_json("/api/services", req).await
    }

    pub async fn update_service(&self, id: Uuid, req: &UpdateService) -> Result<Service, ApiClientError> {
        self.patch_json(&format!("/api/services/{}", id), req).await
    }

    pub async fn delete_service(&self, id: Uuid) -> Result<(), ApiClientError> {
        self.delete(&format!("/api/services/{}", id)).await
    }

    pub async fn availability(&self, service_id: Uuid) -> Result<Vec<ServiceAvailability>, ApiClientError> {
        self.get_json(&format!("/api/services/{}/availability", service_id)).await
    }

    pub async fn create_availability(
        &self,
        service_id: Uuid,
        req: &CreateAvailability,
    ) -> Result<ServiceAvailability, ApiClientError> {
        self.post_json(&format!("/api/services/{}/availability", service_id), req)
            .await
    }

    pub async fn delete_availability(&self, id: Uuid) -> Result<(), ApiClientError> {
        self.delete(&format!("/api/service-availability/{}", id)).await
    }

    pub async fn slots(&self, service_id: Uuid, date: NaiveDate) -> Result<Vec<Slot>, ApiClientError> {
        self.get_json(&format!("/api/services/{}/slots?date={}", service_id, date))
            .await
    }

    // Vehicles and staff

    pub async fn vehicles(&self) -> Result<Vec<Vehicle>, ApiClientError> {
        self.get_json("/api/vehicles").await
    }

    pub async fn vehicle(&self, id: Uuid) -> Result<Vehicle, ApiClientError> {
        self.get_json(&format!("/api/vehicles/{}", id)).await
    }

    pub async fn create_vehicle(&self, req: &CreateVehicle) -> Result<Vehicle, ApiClientError> {
        self.post_json("/api/vehicles", req).await
    }

    pub async fn update_vehicle(&self, id: Uuid, req: &UpdateVehicle) -> Result<Vehicle, ApiClientError> {
        self.patch_json(&format!("/api/vehicles/{}", id), req).await
    }

    pub async fn delete_vehicle(&self, id: Uuid) -> Result<(), ApiClientError> {
        self.delete(&format!("/api/vehicles/{}", id)).await
    }

    pub async fn staff(&self) -> Result<Vec<StaffMember>, ApiClientError> {
        self.get_json("/api/staff").await
    }

    pub async fn staff_member(&self, id: Uuid) -> Result<StaffMember, ApiClientError> {
        self.get_json(&format!("/api/staff/{}", id)).await
    }

    pub async fn create_staff(&self, req: &CreateStaff) -> Result<StaffMember, ApiClientError> {
        self.post_json("/api/staff", req).await
    }

    pub async fn update_staff(&self, id: Uuid, req: &UpdateStaff) -> Result<StaffMember, ApiClientError> {
        self.patch_json(&format!("/api/staff/{}", id), req).await
    }

    pub async fn delete_staff(&self, id: Uuid) -> Result<(), ApiClientError> {
        self.delete(&format!("/api/staff/{}", id)).await
    }

    // Users and clients

    pub async fn users(&self) -> Result<Vec<Profile>, ApiClientError> {
        self.get_json("/api/users").await
    }

    pub async fn user(&self, id: Uuid) -> Result<Profile, ApiClientError> {
        self.get_json(&format!("/api/users/{}", id)).await
    }

    pub async fn update_user(&self, id: Uuid, req: &AdminUpdateUser) -> Result<Profile, ApiClientError> {
        self.patch_json(&format!("/api/users/{}", id), req).await
    }

    pub async fn clients(&self) -> Result<Vec<ClientDetail>, ApiClientError> {
        self.get_json("/api/clients").await
    }

    pub async fn client(&self, id: Uuid) -> Result<ClientDetail, ApiClientError> {
        self.get_json(&format!("/api/clients/{}", id)).await
    }

    pub async fn create_client(&self, req: &CreateClient) -> Result<ClientDetail, ApiClientError> {
        self.post_json("/api/clients", req).await
    }

    pub async fn update_client(&self, id: Uuid, req: &UpdateClient) -> Result<ClientDetail, ApiClientError> {
        self.patch_json(&format!("/api/clients/{}", id), req).await
    }

    // Pets

    pub async fn pets(&self, client_id: Option<Uuid>) -> Result<Vec<Pet>, ApiClientError> {
        match client_id {
            Some(client_id) => self.get_json(&format!("/api/pets?client_id={}", client_id)).await,
            None => self.get_json("/api/pets").await,
        }
    }

    pub async fn pet(&self, id: Uuid) -> Result<Pet, ApiClientError> {
        self.get_json(&format!("/api/pets/{}", id)).await
    }

    pub async fn create_pet(&self, req: &CreatePet) -> Result<Pet, ApiClientError> {
        self.post_json("/api/pets", req).await
    }

    pub async fn update_pet(&self, id: Uuid, req: &UpdatePet) -> Result<Pet, ApiClientError> {
        self.patch_json(&format!("/api/pets/{}", id), req).await
    }

    pub async fn delete_pet(&self, id: Uuid) -> Result<(), ApiClientError> {
        self.delete(&format!("/api/pets/{}", id)).await
    }

    // Bookings

    pub async fn bookings(&self, filter: &BookingFilter) -> Result<Vec<BookingDetail>, ApiClientError> {
        let builder = self.request(Method::GET, "/api/bookings")?.query(filter);
        Self::send(builder).await
    }

    pub async fn booking(&self, id: Uuid) -> Result<BookingDetail, ApiClientError> {
        self.get_json(&format!("/api/bookings/{}", id)).await
    }

    pub async fn my_bookings(&self) -> Result<Vec<BookingDetail>, ApiClientError> {
        self.get_json("/api/my-bookings").await
    }

    pub async fn create_booking(&self, req: &CreateBooking) -> Result<BookingDetail, ApiClientError> {
        self.post_json("/api/bookings", req).await
    }

    pub async fn update_booking(&self, id: Uuid, req: &UpdateBooking) -> Result<BookingDetail, ApiClientError> {
        self.patch_json(&format!("/api/bookings/{}", id), req).await
    }

    pub async fn delete_booking(&self, id: Uuid) -> Result<(), ApiClientError> {
        self.delete(&format!("/api/bookings/{}", id)).await
    }
}

/// Turn a non-2xx response into `ApiClientError::Status` using the API's
/// `{error}` body when present
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    Err(ApiClientError::Status {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn paths_resolve_against_base_url() {
        let client = ApiClient::new("http://localhost:3000").unwrap();
        let builder = client.request(Method::GET, "/api/sites").unwrap();
        let request = builder.build().unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:3000/api/sites");
        assert!(request.headers().get("authorization").is_none());
    }

    #[test]
    fn token_becomes_bearer_header() {
        let client = ApiClient::new("http://localhost:3000").unwrap().with_token("abc");
        let request = client.request(Method::GET, "/api/auth/me").unwrap().build().unwrap();
        assert_eq!(request.headers()["authorization"], "Bearer abc");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(ApiClient::new("not a url"), Err(ApiClientError::Url(_))));
    }

    #[test]
    fn status_errors_expose_code() {
        let err = ApiClientError::Status {
            status: StatusCode::CONFLICT.as_u16(),
            message: "Slot is full".to_string(),
        };
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "409: Slot is full");
    }
}
