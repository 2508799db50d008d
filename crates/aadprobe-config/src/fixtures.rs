use std::str::FromStr;

use uuid::Uuid;

use crate::error::ConfigError;

/// Address every fixture declares its application under.
pub const FIXTURE_ADDRESS: &str = "azuread_application.test";

/// Configuration variants of the `azuread_application` fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Name only; everything else defaulted by the provider.
    Basic,
    /// Multi-tenant app with one identifier URI.
    AvailableToOtherTenants,
    /// Homepage, identifier URI, reply URL and implicit flow.
    Complete,
}

impl Variant {
    pub const ALL: [Variant; 3] = [
        Variant::Basic,
        Variant::AvailableToOtherTenants,
        Variant::Complete,
    ];
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Basic => write!(f, "basic"),
            Variant::AvailableToOtherTenants => write!(f, "available-to-other-tenants"),
            Variant::Complete => write!(f, "complete"),
        }
    }
}

impl FromStr for Variant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Variant::Basic),
            "available-to-other-tenants" => Ok(Variant::AvailableToOtherTenants),
            "complete" => Ok(Variant::Complete),
            other => Err(ConfigError::UnknownVariant(other.to_string())),
        }
    }
}

/// The attribute values a fixture asks the provider for.
///
/// `homepage` is `None` when the fixture leaves it to the provider default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationSpec {
    pub name: String,
    pub homepage: Option<String>,
    pub identifier_uris: Vec<String>,
    pub reply_urls: Vec<String>,
    pub available_to_other_tenants: bool,
    pub oauth2_allow_implicit_flow: bool,
}

impl ApplicationSpec {
    /// Homepage after provider defaulting (`https://<name>`).
    pub fn effective_homepage(&self) -> String {
        self.homepage
            .clone()
            .unwrap_or_else(|| format!("https://{}", self.name))
    }
}

/// One rendered resource definition, parameterised by a unique test id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub variant: Variant,
    pub id: String,
}

impl Fixture {
    pub fn new(variant: Variant, id: impl Into<String>) -> Self {
        Self { variant, id: id.into() }
    }

    /// Fixture with a fresh v4 UUID as its test id.
    pub fn random(variant: Variant) -> Self {
        Self::new(variant, Uuid::new_v4().to_string())
    }

    pub fn name(&self) -> String {
        format!("acctest{}", self.id)
    }

    pub fn spec(&self) -> ApplicationSpec {
        let id = &self.id;
        match self.variant {
            Variant::Basic => ApplicationSpec {
                name: self.name(),
                homepage: None,
                identifier_uris: vec![],
                reply_urls: vec![],
                available_to_other_tenants: false,
                oauth2_allow_implicit_flow: false,
            },
            Variant::AvailableToOtherTenants => ApplicationSpec {
                name: self.name(),
                homepage: None,
                identifier_uris: vec![format!("https://{}.hashicorptest.com", id)],
                reply_urls: vec![],
                available_to_other_tenants: true,
                oauth2_allow_implicit_flow: false,
            },
            Variant::Complete => ApplicationSpec {
                name: self.name(),
                homepage: Some(format!("https://homepage-{}", id)),
                identifier_uris: vec![format!("http://{}.hashicorptest.com", id)],
                reply_urls: vec![format!("http://{}.hashicorptest.com", id)],
                available_to_other_tenants: false,
                oauth2_allow_implicit_flow: true,
            },
        }
    }

    /// Render the HCL for this fixture.
    pub fn render(&self) -> String {
        let spec = self.spec();
        let mut body = vec![format!("  name = \"{}\"", spec.name)];
        if let Some(h) = &spec.homepage {
            body.push(format!("  homepage = \"{}\"", h));
        }
        if !spec.identifier_uris.is_empty() {
            body.push(format!("  identifier_uris = {}", hcl_list(&spec.identifier_uris)));
        }
        if !spec.reply_urls.is_empty() {
            body.push(format!("  reply_urls = {}", hcl_list(&spec.reply_urls)));
        }
        if spec.available_to_other_tenants {
            body.push("  available_to_other_tenants = true".to_string());
        }
        if spec.oauth2_allow_implicit_flow {
            body.push("  oauth2_allow_implicit_flow = true".to_string());
        }

        let (rtype, rname) = FIXTURE_ADDRESS
            .split_once('.')
            .unwrap_or((FIXTURE_ADDRESS, "test"));
        format!(
            "\nresource \"{}\" \"{}\" {{\n{}\n}}\n",
            rtype,
            rname,
            body.join("\n")
        )
    }

    /// Attribute values the applied state must carry, in flattened key form.
    pub fn expected_attrs(&self) -> Vec<(String, String)> {
        let spec = self.spec();
        vec![
            ("name".into(), spec.name.clone()),
            ("homepage".into(), spec.effective_homepage()),
            ("identifier_uris.#".into(), spec.identifier_uris.len().to_string()),
            ("reply_urls.#".into(), spec.reply_urls.len().to_string()),
            (
                "available_to_other_tenants".into(),
                spec.available_to_other_tenants.to_string(),
            ),
            (
                "oauth2_allow_implicit_flow".into(),
                spec.oauth2_allow_implicit_flow.to_string(),
            ),
        ]
    }
}

fn hcl_list(items: &[String]) -> String {
    let quoted: Vec<String> = items.iter().map(|i| format!("\"{}\"", i)).collect();
    format!("[{}]", quoted.join(", "))
}
