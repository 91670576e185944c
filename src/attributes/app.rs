use crate::attributes::value::AttributeBag;
use crate::error::ConvertError;
use crate::state::SharingLevel;
use crate::terraform::RawResource;

#[derive(Debug, Clone, Default)]
pub struct AppAttributes {
    pub slug: String,
    pub display_name: String,
    pub icon: String,
    pub command: String,
    pub url: String,
    pub external: bool,
    pub subdomain: bool,
    pub share: SharingLevel,
    pub healthcheck: Option<HealthcheckAttributes>,
    pub order: i64,
}

#[derive(Debug, Clone, Default)]
pub struct HealthcheckAttributes {
    pub url: String,
    pub interval: i64,
    pub threshold: i64,
}

impl AppAttributes {
    pub fn decode(resource: &RawResource) -> Result<Self, ConvertError> {
        let bag = AttributeBag::new(&resource.address, &resource.attributes);

        // `display_name` superseded the deprecated `name` attribute;
        // templates in the wild still carry either.
        let display_name = match bag.str_or_default("display_name")? {
            name if name.is_empty() => bag.str_or_default("name")?,
            name => name,
        };

        let share = bag.str_or_default("share")?;
        let share = SharingLevel::parse(&share)
            .map_err(|reason| ConvertError::decode(&resource.address, reason))?;

        let healthcheck = match bag.blocks("healthcheck")?.first() {
            None => None,
            Some(block) => Some(HealthcheckAttributes {
                url: block.str_or_default("url")?,
                interval: block.i64_or_default("interval")?,
                threshold: block.i64_or_default("threshold")?,
            }),
        };

        Ok(Self {
            slug: bag.require_str("slug")?,
            display_name,
            icon: bag.str_or_default("icon")?,
            command: bag.str_or_default("command")?,
            url: bag.str_or_default("url")?,
            external: bag.bool_or_default("external")?,
            subdomain: bag.bool_or_default("subdomain")?,
            share,
            healthcheck,
            order: bag.i64_or_default("order")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terraform::ResourceMode;

    fn app_resource(attributes: &str) -> RawResource {
        RawResource {
            address: "coder_app.code-server".to_string(),
            resource_type: "coder_app".to_string(),
            name: "code-server".to_string(),
            mode: ResourceMode::Managed,
            attributes: serde_json::from_str(attributes).expect("fixture attributes"),
            depends_on: Vec::new(),
        }
    }

    #[test]
    fn decodes_app_with_healthcheck() {
        let resource = app_resource(
            r#"{
                "slug": "code-server",
                "display_name": "code-server",
                "url": "http://localhost:13337?folder=/home/coder",
                "subdomain": true,
                "share": "authenticated",
                "healthcheck": [{"url": "http://localhost:13337/healthz", "interval": 5, "threshold": 6}]
            }"#,
        );
        let attrs = AppAttributes::decode(&resource).expect("decode app");
        assert_eq!(attrs.slug, "code-server");
        assert_eq!(attrs.share, SharingLevel::Authenticated);
        let healthcheck = attrs.healthcheck.expect("healthcheck block");
        assert_eq!(healthcheck.interval, 5);
        assert_eq!(healthcheck.threshold, 6);
    }

    #[test]
    fn legacy_name_attribute_backfills_display_name() {
        let resource = app_resource(r#"{"slug": "app1", "name": "app1"}"#);
        let attrs = AppAttributes::decode(&resource).expect("decode app");
        assert_eq!(attrs.display_name, "app1");
    }

    #[test]
    fn missing_slug_is_a_decode_error() {
        let resource = app_resource(r#"{"display_name": "app1"}"#);
        let err = AppAttributes::decode(&resource).expect_err("must fail");
        assert!(err.to_string().contains("`slug`"));
    }

    #[test]
    fn unknown_sharing_level_is_rejected() {
        let resource = app_resource(r#"{"slug": "app1", "share": "everyone"}"#);
        let err = AppAttributes::decode(&resource).expect_err("must fail");
        assert!(err.to_string().contains("sharing level"));
    }
}
