use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;
use utoipa::ToSchema;

use crate::{errors::ServiceError, models::PaymentMethod};

/// Storefront settings document served to the public site and edited from
/// the admin panel.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StoreSettings {
    pub delivery_fee: Decimal,
    pub business_name: String,
    pub business_phone: String,
    pub pix_key: String,
    pub pix_owner: String,
    pub payment_methods: Vec<PaymentMethodOption>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentMethodOption {
    pub value: PaymentMethod,
    pub label: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            delivery_fee: dec!(5.00),
            business_name: "Pizzaria Oliveira".to_string(),
            business_phone: "5500900000000".to_string(),
            pix_key: "pedidos@pizzariaoliveira.example".to_string(),
            pix_owner: "Pizzaria Oliveira".to_string(),
            payment_methods: vec![
                PaymentMethodOption {
                    value: PaymentMethod::Pix,
                    label: "PIX".to_string(),
                },
                PaymentMethodOption {
                    value: PaymentMethod::Credit,
                    label: "Cartão de Crédito".to_string(),
                },
                PaymentMethodOption {
                    value: PaymentMethod::Debit,
                    label: "Cartão de Débito".to_string(),
                },
                PaymentMethodOption {
                    value: PaymentMethod::Cash,
                    label: "Dinheiro".to_string(),
                },
            ],
        }
    }
}

/// Merge-update for the settings document; absent fields keep their value.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SettingsUpdate {
    pub delivery_fee: Option<Decimal>,
    pub business_name: Option<String>,
    pub business_phone: Option<String>,
    pub pix_key: Option<String>,
    pub pix_owner: Option<String>,
    pub payment_methods: Option<Vec<PaymentMethodOption>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Neighborhood {
    pub name: String,
}

/// In-process settings store, constructed once per application lifetime and
/// shared through the app state. Mutations hold the write lock only for the
/// merge itself.
pub struct SettingsStore {
    settings: RwLock<StoreSettings>,
    neighborhoods: RwLock<Vec<String>>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::with_settings(StoreSettings::default())
    }

    pub fn with_settings(settings: StoreSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
            neighborhoods: RwLock::new(default_neighborhoods()),
        }
    }

    pub async fn get(&self) -> StoreSettings {
        self.settings.read().await.clone()
    }

    /// Applies a merge-update and returns the resulting document.
    pub async fn update(&self, update: SettingsUpdate) -> Result<StoreSettings, ServiceError> {
        if let Some(fee) = update.delivery_fee {
            if fee < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Delivery fee cannot be negative".to_string(),
                ));
            }
        }

        let mut settings = self.settings.write().await;
        if let Some(fee) = update.delivery_fee {
            settings.delivery_fee = fee;
        }
        if let Some(name) = update.business_name {
            settings.business_name = name;
        }
        if let Some(phone) = update.business_phone {
            settings.business_phone = phone;
        }
        if let Some(key) = update.pix_key {
            settings.pix_key = key;
        }
        if let Some(owner) = update.pix_owner {
            settings.pix_owner = owner;
        }
        if let Some(methods) = update.payment_methods {
            settings.payment_methods = methods;
        }

        info!("store settings updated");
        Ok(settings.clone())
    }

    pub async fn neighborhoods(&self) -> Vec<Neighborhood> {
        self.neighborhoods
            .read()
            .await
            .iter()
            .map(|name| Neighborhood { name: name.clone() })
            .collect()
    }

    /// Adds a delivery neighborhood; duplicates (case-insensitive) conflict.
    pub async fn add_neighborhood(&self, name: &str) -> Result<Neighborhood, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Neighborhood name is required".to_string(),
            ));
        }

        let mut neighborhoods = self.neighborhoods.write().await;
        if neighborhoods
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(name))
        {
            return Err(ServiceError::Conflict(format!(
                "Neighborhood '{name}' already exists"
            )));
        }

        neighborhoods.push(name.to_string());
        neighborhoods.sort();

        info!(neighborhood = %name, "neighborhood added");
        Ok(Neighborhood {
            name: name.to_string(),
        })
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

fn default_neighborhoods() -> Vec<String> {
    [
        "Bela Vista",
        "Centro",
        "Jardim das Oliveiras",
        "Primavera",
        "São José",
        "Vila das Palmeiras",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}
