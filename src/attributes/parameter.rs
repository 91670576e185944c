use crate::attributes::value::AttributeBag;
use crate::error::ConvertError;
use crate::state::ParameterType;
use crate::terraform::RawResource;

#[derive(Debug, Clone, Default)]
pub struct ParameterAttributes {
    pub name: String,
    pub parameter_type: ParameterType,
    pub description: String,
    /// `None` when the template declares no default, which makes the
    /// parameter required.
    pub default_value: Option<String>,
    pub mutable: bool,
    pub ephemeral: bool,
    pub icon: String,
    pub options: Vec<ParameterOptionAttributes>,
    pub validation: Option<ParameterValidationAttributes>,
    pub order: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ParameterOptionAttributes {
    pub name: String,
    pub description: String,
    pub value: String,
    pub icon: String,
}

/// Bounds keep key presence: a declared `min = 0` decodes as `Some(0)`,
/// never as absent.
#[derive(Debug, Clone, Default)]
pub struct ParameterValidationAttributes {
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub regex: String,
    pub error: String,
    pub monotonic: String,
}

impl ParameterAttributes {
    pub fn decode(resource: &RawResource) -> Result<Self, ConvertError> {
        let bag = AttributeBag::new(&resource.address, &resource.attributes);

        let raw_type = bag.str_or_default("type")?;
        let parameter_type = ParameterType::parse(&raw_type)
            .map_err(|reason| ConvertError::decode(&resource.address, reason))?;

        let options = bag
            .blocks("option")?
            .iter()
            .map(|block| {
                Ok(ParameterOptionAttributes {
                    name: block.require_str("name")?,
                    description: block.str_or_default("description")?,
                    value: block.scalar_string("value")?.unwrap_or_default(),
                    icon: block.str_or_default("icon")?,
                })
            })
            .collect::<Result<Vec<_>, ConvertError>>()?;

        let validation = match bag.blocks("validation")?.first() {
            None => None,
            Some(block) => Some(ParameterValidationAttributes {
                min: block.opt_i32("min")?,
                max: block.opt_i32("max")?,
                regex: block.str_or_default("regex")?,
                error: block.str_or_default("error")?,
                monotonic: block.str_or_default("monotonic")?,
            }),
        };

        Ok(Self {
            name: bag.require_str("name")?,
            parameter_type,
            description: bag.str_or_default("description")?,
            default_value: bag.scalar_string("default")?,
            mutable: bag.bool_or_default("mutable")?,
            ephemeral: bag.bool_or_default("ephemeral")?,
            icon: bag.str_or_default("icon")?,
            options,
            validation,
            order: bag.i64_or_default("order")?,
        })
    }
}
