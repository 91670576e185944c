use crate::attributes::value::AttributeBag;
use crate::error::ConvertError;
use crate::terraform::RawResource;

#[derive(Debug, Clone, Default)]
pub struct ScriptAttributes {
    pub agent_id: String,
    pub display_name: String,
    pub icon: String,
    pub script: String,
    pub cron: String,
    pub log_path: String,
    pub log_source_id: String,
    pub start_blocks_login: bool,
    pub run_on_start: bool,
    pub run_on_stop: bool,
    pub timeout_seconds: i64,
}

impl ScriptAttributes {
    pub fn decode(resource: &RawResource) -> Result<Self, ConvertError> {
        let bag = AttributeBag::new(&resource.address, &resource.attributes);
        Ok(Self {
            agent_id: bag.str_or_default("agent_id")?,
            display_name: bag.str_or_default("display_name")?,
            icon: bag.str_or_default("icon")?,
            script: bag.require_str("script")?,
            cron: bag.str_or_default("cron")?,
            log_path: bag.str_or_default("log_path")?,
            // decoded, never generated: conversion output must be
            // byte-identical across repeated runs
            log_source_id: bag.str_or_default("log_source_id")?,
            start_blocks_login: bag.bool_or_default("start_blocks_login")?,
            run_on_start: bag.bool_or_default("run_on_start")?,
            run_on_stop: bag.bool_or_default("run_on_stop")?,
            timeout_seconds: bag.i64_or_default("timeout")?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnvAttributes {
    pub agent_id: String,
    pub name: String,
    pub value: String,
}

impl EnvAttributes {
    pub fn decode(resource: &RawResource) -> Result<Self, ConvertError> {
        let bag = AttributeBag::new(&resource.address, &resource.attributes);
        Ok(Self {
            agent_id: bag.str_or_default("agent_id")?,
            name: bag.require_str("name")?,
            value: bag.str_or_default("value")?,
        })
    }
}
