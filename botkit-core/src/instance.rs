use machineid_rs::{Encryption, HWIDComponent, IdBuilder};
use serde::{Deserialize, Serialize};
use sysinfo::System;

use crate::request::ActivationRequest;

pub const INSTANCE_ID_FIELD: &str = "instance_id";
pub const INSTANCE_NAME_FIELD: &str = "instance_name";

/// The installation a license gets bound to.
#[derive(Serialize, Deserialize, Default, Debug, Eq, PartialEq, Clone)]
pub struct Instance {
    pub id: String,
    pub name: String,
}

impl Instance {
    /// Hashes the OS and machine name with `instance_key`, so the same host
    /// reports the same id for every activation.
    #[must_use]
    pub fn detect(instance_key: &str) -> Option<Self> {
        let id = IdBuilder::new(Encryption::SHA256).add_component(HWIDComponent::OSName).add_component(HWIDComponent::MachineName).build(instance_key).ok()?;
        let name = System::host_name().unwrap_or_default();

        Some(Self { id, name })
    }

    #[must_use]
    pub fn attach(&self, request: ActivationRequest) -> ActivationRequest {
        request.field(INSTANCE_ID_FIELD, &self.id).field(INSTANCE_NAME_FIELD, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ActivationAction;

    #[test]
    fn attach_adds_instance_fields() {
        let instance = Instance { id: "ABC".into(), name: "web-01".into() };
        let req = instance.attach(ActivationRequest::new(ActivationAction::Check, "n"));

        assert_eq!(req.get(INSTANCE_ID_FIELD), Some("ABC"));
        assert_eq!(req.get(INSTANCE_NAME_FIELD), Some("web-01"));
    }
}
