//! The closed catalog of backend tools.
//!
//! A runtime string selecting behavior is an invitation for typos to travel,
//! so the known tools are an enum: names coming out of the model are
//! normalized and parsed at the boundary, and everything past it works with
//! a variant.

use opsrelay_core::tool::ToolDescriptor;

/// The operations the resource-management backend exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownTool {
    /// List environments, with optional pagination.
    GetEnvironments,
    /// Create a new environment.
    CreateEnvironment,
    /// Look up a GitOps runtime by resource.
    GetGitopsRuntime,
}

impl KnownTool {
    pub const ALL: [KnownTool; 3] = [
        KnownTool::GetEnvironments,
        KnownTool::CreateEnvironment,
        KnownTool::GetGitopsRuntime,
    ];

    /// Parse a tool name. Surrounding whitespace is trimmed; the comparison
    /// itself is case-sensitive exact match.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "get_environments" => Some(Self::GetEnvironments),
            "create_environment" => Some(Self::CreateEnvironment),
            "get_gitops_runtime" => Some(Self::GetGitopsRuntime),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::GetEnvironments => "get_environments",
            Self::CreateEnvironment => "create_environment",
            Self::GetGitopsRuntime => "get_gitops_runtime",
        }
    }

    /// The schema descriptor for this tool.
    pub fn descriptor(&self) -> ToolDescriptor {
        match self {
            Self::GetEnvironments => ToolDescriptor::new(self.name())
                .optional("offset", "Offset for pagination (default 0)")
                .optional("limit", "Maximum number of items to return (default 100)"),

            Self::CreateEnvironment => ToolDescriptor::new(self.name())
                .required("name", "Environment name")
                .required("resource_type", "Resource type, e.g. CCE")
                .required("context", "Deployment context with region and cluster_id")
                .optional("description", "Free-text description")
                .optional("environment_category_id", "Environment category identifier")
                .optional("user_type", "Numeric user type (default 0)"),

            Self::GetGitopsRuntime => ToolDescriptor::new(self.name())
                .required("environment_id", "The environment to inspect")
                .required("resource_id", "The resource identifier")
                .required("resource_type", "The resource type"),
        }
    }
}

impl std::fmt::Display for KnownTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
