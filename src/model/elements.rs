//! Structured symbol model written to and rebuilt from the index.

use serde::{Deserialize, Serialize};

/// Name of the universal base type.
pub const ROOT_TYPE: &str = "Object";

/// Platform/browser a symbol is available on.
///
/// Identity is structural: two descriptors with equal fields are the same
/// user agent and share one index key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct UserAgent {
    pub description: String,
    pub os: String,
    pub platform: String,
    pub version: String,
}

impl UserAgent {
    pub fn new(
        description: impl Into<String>,
        os: impl Into<String>,
        platform: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            os: os.into(),
            platform: platform.into(),
            version: version.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterElement {
    pub name: String,
    /// Usage marker such as `required`, `optional` or `one-or-more`.
    #[serde(default)]
    pub usage: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl ParameterElement {
    pub fn new(name: impl Into<String>, usage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            usage: usage.into(),
            types: Vec::new(),
        }
    }

    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.types.push(type_name.into());
        self
    }
}

/// A return type of a function, or a declared value type of a property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnTypeElement {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ReturnTypeElement {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyElement {
    pub name: String,
    /// Name of the type declaring this member. Set by
    /// [`TypeElement::add_member`] and by the writer from the enclosing type.
    #[serde(default)]
    pub owning_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub types: Vec<ReturnTypeElement>,
    #[serde(default)]
    pub user_agents: Vec<UserAgent>,
}

impl PropertyElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_type(mut self, value_type: ReturnTypeElement) -> Self {
        self.types.push(value_type);
        self
    }

    pub fn with_user_agent(mut self, user_agent: UserAgent) -> Self {
        self.user_agents.push(user_agent);
        self
    }
}

/// A callable member. The property payload carries the shared fields; its
/// `types` are not part of the function record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionElement {
    #[serde(flatten)]
    pub property: PropertyElement,
    #[serde(default)]
    pub parameters: Vec<ParameterElement>,
    #[serde(default)]
    pub return_types: Vec<ReturnTypeElement>,
}

impl FunctionElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            property: PropertyElement::new(name),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.property.name
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.property.description = Some(description.into());
        self
    }

    pub fn with_parameter(mut self, parameter: ParameterElement) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_return_type(mut self, return_type: ReturnTypeElement) -> Self {
        self.return_types.push(return_type);
        self
    }

    pub fn with_user_agent(mut self, user_agent: UserAgent) -> Self {
        self.property.user_agents.push(user_agent);
        self
    }
}

/// A member of a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Member {
    Property(PropertyElement),
    Function(FunctionElement),
}

impl Member {
    /// Fields shared by both member kinds.
    pub fn property(&self) -> &PropertyElement {
        match self {
            Member::Property(property) => property,
            Member::Function(function) => &function.property,
        }
    }

    pub fn property_mut(&mut self) -> &mut PropertyElement {
        match self {
            Member::Property(property) => property,
            Member::Function(function) => &mut function.property,
        }
    }

    pub fn name(&self) -> &str {
        &self.property().name
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Member::Function(_))
    }
}

impl From<PropertyElement> for Member {
    fn from(property: PropertyElement) -> Self {
        Member::Property(property)
    }
}

impl From<FunctionElement> for Member {
    fn from(function: FunctionElement) -> Self {
        Member::Function(function)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeElement {
    pub name: String,
    #[serde(default)]
    pub parent_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub user_agents: Vec<UserAgent>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl TypeElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_root(&self) -> bool {
        self.name == ROOT_TYPE
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_types.push(parent.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: UserAgent) -> Self {
        self.user_agents.push(user_agent);
        self
    }

    pub fn with_member(mut self, member: impl Into<Member>) -> Self {
        self.add_member(member);
        self
    }

    /// Add a member, making this type its owner.
    pub fn add_member(&mut self, member: impl Into<Member>) {
        let mut member = member.into();
        let property = member.property_mut();
        if property.owning_type != self.name {
            property.owning_type.clone_from(&self.name);
        }
        self.members.push(member);
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|member| member.name() == name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionElement> {
        self.members.iter().filter_map(|member| match member {
            Member::Function(function) => Some(function),
            Member::Property(_) => None,
        })
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyElement> {
        self.members.iter().filter_map(|member| match member {
            Member::Property(property) => Some(property),
            Member::Function(_) => None,
        })
    }
}
