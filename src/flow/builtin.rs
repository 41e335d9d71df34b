use super::FlowFile;
use crate::errors::FlowError;

const ORGANIZATION: &str = include_str!("../../flows/organization.toml");
const INVITE_USER: &str = include_str!("../../flows/invite-user.toml");
const APPLICATION: &str = include_str!("../../flows/application.toml");

/// The flows shipped with the binary.
pub fn builtin_flows() -> Result<Vec<FlowFile>, FlowError> {
    [ORGANIZATION, INVITE_USER, APPLICATION]
        .into_iter()
        .map(FlowFile::from_toml)
        .collect()
}
