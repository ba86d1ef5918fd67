use serde::{Deserialize, Serialize};

/// Vector namespace shared by every `global_perm` attachment.
pub const GLOBAL_NAMESPACE: &str = "global";

/// Visibility/lifetime class of an attachment. The category alone decides the
/// vector namespace and the retrieval filter; nothing else branches on it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
	PersonalPerm,
	PersonalTemp,
	GlobalPerm,
}
impl Category {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::PersonalPerm => "personal_perm",
			Self::PersonalTemp => "personal_temp",
			Self::GlobalPerm => "global_perm",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"personal_perm" => Some(Self::PersonalPerm),
			"personal_temp" => Some(Self::PersonalTemp),
			"global_perm" => Some(Self::GlobalPerm),
			_ => None,
		}
	}

	pub fn namespace(&self, owner_id: &str) -> String {
		match self {
			Self::GlobalPerm => GLOBAL_NAMESPACE.to_string(),
			_ => owner_id.to_string(),
		}
	}

	pub fn is_temp(&self) -> bool {
		matches!(self, Self::PersonalTemp)
	}

	/// Fixed retrieval priority: personal permanent, then personal temporary,
	/// then global.
	pub fn retrieval_tiers() -> [Self; 3] {
		[Self::PersonalPerm, Self::PersonalTemp, Self::GlobalPerm]
	}
}
