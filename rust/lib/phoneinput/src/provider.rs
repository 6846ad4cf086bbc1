use std::future::{self, Future};
use std::pin::Pin;
use std::sync::Arc;

use crate::country_code::CountryCode;
use crate::error::PhoneInputError;

/// A boxed, `Send`-able future returned by country-code providers.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

pub type FetchResult = Result<Vec<CountryCode>, PhoneInputError>;

/// Source of the country-code list.
///
/// `prev` is only a trigger: a failed `prev` is returned as the result
/// without fetching, a successful one is ignored.
pub trait CountryCodeProvider: Send + Sync {
    fn fetch_codes(&self, prev: Result<(), PhoneInputError>) -> BoxFuture<FetchResult>;
}

/// In-memory country codes.
#[derive(Debug, Clone, Default)]
pub struct StaticCountryCodes {
    codes: Arc<Vec<CountryCode>>,
}

impl StaticCountryCodes {
    pub fn new(codes: Vec<CountryCode>) -> Self {
        Self {
            codes: Arc::new(codes),
        }
    }

    /// Load from a JSON array of `{"name", "code", "callingCode"}` objects.
    pub fn from_json(json: &str) -> Result<Self, PhoneInputError> {
        let codes: Vec<CountryCode> = serde_json::from_str(json)?;
        Ok(Self::new(codes))
    }

    pub fn codes(&self) -> &[CountryCode] {
        &self.codes
    }
}

impl CountryCodeProvider for StaticCountryCodes {
    fn fetch_codes(&self, prev: Result<(), PhoneInputError>) -> BoxFuture<FetchResult> {
        let result = prev.map(|()| self.codes.as_ref().clone());
        Box::pin(future::ready(result))
    }
}

type ErasedFetch = Arc<dyn Fn() -> BoxFuture<FetchResult> + Send + Sync>;

/// Provider backed by an async closure.
///
/// # Examples
///
/// ```ignore
/// let failing = FnCountryCodes::new(|| async {
///     Err::<Vec<CountryCode>, _>(PhoneInputError::Fetch("Network unreachable".to_string()))
/// });
/// ```
#[derive(Clone)]
pub struct FnCountryCodes {
    fetch: ErasedFetch,
}

impl FnCountryCodes {
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = FetchResult> + Send + 'static,
    {
        let fetch: ErasedFetch = Arc::new(move || -> BoxFuture<FetchResult> { Box::pin(fetch()) });
        Self { fetch }
    }
}

impl CountryCodeProvider for FnCountryCodes {
    fn fetch_codes(&self, prev: Result<(), PhoneInputError>) -> BoxFuture<FetchResult> {
        match prev {
            Ok(()) => (self.fetch)(),
            Err(err) => Box::pin(future::ready(Err(err))),
        }
    }
}

impl std::fmt::Debug for FnCountryCodes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnCountryCodes")
    }
}
