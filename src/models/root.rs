use serde::{Deserialize, Serialize};

use super::{non_empty, ValidationError, Violation};

/// Agent/patient forms of a single mode, as clients send them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prim: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act_agt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act_pat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pas_agt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pas_pat: Option<String>,
}

impl ModeFields {
    /// True when every leaf is absent or empty.
    pub fn is_blank(&self) -> bool {
        [
            &self.prim,
            &self.act_agt,
            &self.act_pat,
            &self.pas_agt,
            &self.pas_pat,
        ]
        .iter()
        .all(|leaf| leaf.as_deref().map_or(true, str::is_empty))
    }

    fn normalized(self) -> Self {
        Self {
            prim: non_empty(self.prim),
            act_agt: non_empty(self.act_agt),
            act_pat: non_empty(self.act_pat),
            pas_agt: non_empty(self.pas_agt),
            pas_pat: non_empty(self.pas_pat),
        }
    }
}

/// Mode fields holding at least one non-empty form. Empty strings are
/// stored as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ModeForms(ModeFields);

impl ModeForms {
    fn new(mode: &'static str, fields: ModeFields) -> Result<Self, Violation> {
        let fields = fields.normalized();
        if fields.is_blank() {
            return Err(Violation::EmptyMode(mode));
        }
        Ok(Self(fields))
    }

    pub fn fields(&self) -> &ModeFields {
        &self.0
    }
}

/// Raw mode block: `base` is mandatory, the rest optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeData {
    pub base: ModeFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<ModeFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strong: Option<ModeFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redup: Option<ModeFields>,
}

/// Validated mode block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Modes {
    pub base: ModeForms,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long: Option<ModeForms>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strong: Option<ModeForms>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redup: Option<ModeForms>,
}

impl TryFrom<ModeData> for Modes {
    type Error = ValidationError;

    fn try_from(data: ModeData) -> Result<Self, Self::Error> {
        let mut violations = Vec::new();

        let base = ModeForms::new("base", data.base)
            .map_err(|v| violations.push(v))
            .ok();

        // A supplied optional mode must carry something; only omission means "absent".
        let mut optional = |mode: &'static str, fields: Option<ModeFields>| {
            fields.and_then(|fields| {
                ModeForms::new(mode, fields)
                    .map_err(|v| violations.push(v))
                    .ok()
            })
        };
        let long = optional("long", data.long);
        let strong = optional("strong", data.strong);
        let redup = optional("redup", data.redup);

        match base {
            Some(base) if violations.is_empty() => Ok(Self {
                base,
                long,
                strong,
                redup,
            }),
            _ => Err(ValidationError { violations }),
        }
    }
}

/// A root as clients send it and as the store keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootDocument {
    pub root: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prim: Option<String>,
    pub mode: ModeData,
}

/// A validated root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RootDocument")]
pub struct Root {
    pub root: String,
    /// Primary meaning
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prim: Option<String>,
    pub mode: Modes,
}

impl TryFrom<RootDocument> for Root {
    type Error = ValidationError;

    fn try_from(doc: RootDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            root: doc.root,
            prim: non_empty(doc.prim),
            mode: Modes::try_from(doc.mode)?,
        })
    }
}

impl Root {
    /// Apply a partial update. A supplied `mode` replaces the stored one and
    /// is validated in full; omitted, null and empty fields keep their value.
    pub fn apply(self, patch: RootPatch) -> Result<Self, ValidationError> {
        let mode = match patch.mode {
            Some(mode) => Modes::try_from(mode)?,
            None => self.mode,
        };

        Ok(Self {
            root: non_empty(patch.root).unwrap_or(self.root),
            prim: non_empty(patch.prim).or(self.prim),
            mode,
        })
    }
}

/// Body of `PUT /roots/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RootPatch {
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub prim: Option<String>,
    #[serde(default)]
    pub mode: Option<ModeData>,
}

impl RootPatch {
    /// True when nothing survives the null/empty filter.
    pub fn is_empty(&self) -> bool {
        self.root.as_deref().map_or(true, str::is_empty)
            && self.prim.as_deref().map_or(true, str::is_empty)
            && self.mode.is_none()
    }
}
