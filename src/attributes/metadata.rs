use crate::attributes::value::AttributeBag;
use crate::error::ConvertError;
use crate::terraform::RawResource;

/// A `coder_metadata` block: display decoration for exactly one
/// infrastructure resource. `resource_id` is the provider-side identifier
/// of the intended target; ownership is resolved through the dependency
/// graph, which the provider guarantees agrees with it.
#[derive(Debug, Clone, Default)]
pub struct MetadataAttributes {
    pub resource_id: String,
    pub hide: bool,
    pub icon: String,
    pub daily_cost: i32,
    pub items: Vec<MetadataItemAttributes>,
}

#[derive(Debug, Clone, Default)]
pub struct MetadataItemAttributes {
    pub key: String,
    pub value: String,
    pub is_null: bool,
    pub sensitive: bool,
}

impl MetadataAttributes {
    pub fn decode(resource: &RawResource) -> Result<Self, ConvertError> {
        let bag = AttributeBag::new(&resource.address, &resource.attributes);
        let items = bag
            .blocks("item")?
            .iter()
            .map(|block| {
                Ok(MetadataItemAttributes {
                    key: block.require_str("key")?,
                    value: block.scalar_string("value")?.unwrap_or_default(),
                    is_null: block.bool_or_default("is_null")?,
                    sensitive: block.bool_or_default("sensitive")?,
                })
            })
            .collect::<Result<Vec<_>, ConvertError>>()?;
        Ok(Self {
            resource_id: bag.str_or_default("resource_id")?,
            hide: bag.bool_or_default("hide")?,
            icon: bag.str_or_default("icon")?,
            daily_cost: bag.i32_or_default("daily_cost")?,
            items,
        })
    }
}
