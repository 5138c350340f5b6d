//! Request classification.
//!
//! Maps every intercepted request to exactly one [`ResourceClass`]:
//!
//! 1. image destination → `image`
//! 2. same origin as the app → `document` for navigations or paths ending
//!    in `/`, otherwise `static-asset`
//! 3. a font-provider origin → `font`
//! 4. anything else → `external`

use lantern_core::{AppConfig, ConfigError, ResourceClass};
use url::{Origin, Url};

use crate::request::{Destination, InterceptedRequest};

/// Pure request classifier for one deployment.
#[derive(Debug, Clone)]
pub struct Classifier {
    origin: Origin,
    font_origins: Vec<Origin>,
}

impl Classifier {
    pub fn new(origin: &Url, font_origins: &[Url]) -> Self {
        Self { origin: origin.origin(), font_origins: font_origins.iter().map(Url::origin).collect() }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(&config.origin_url()?, &config.font_origin_urls()?))
    }

    pub fn classify(&self, request: &InterceptedRequest) -> ResourceClass {
        if request.destination == Destination::Image {
            return ResourceClass::Image;
        }

        let origin = request.url.origin();
        if origin == self.origin {
            if request.is_navigation() || request.url.path().ends_with('/') {
                return ResourceClass::Document;
            }
            return ResourceClass::StaticAsset;
        }

        if self.font_origins.contains(&origin) {
            return ResourceClass::Font;
        }

        ResourceClass::External
    }
}
