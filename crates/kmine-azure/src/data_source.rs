//! Retrieval augmentation ("on your data") parameters.
//!
//! A [`DataSource`] attached to a chat completion request makes the service
//! query an Azure AI Search index and ground the answer in the retrieved
//! chunks. The index itself is never called directly from this crate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Defaults matching the call-transcript index layout.
mod defaults {
    pub const SEMANTIC_CONFIGURATION: &str = "my-semantic-config";
    pub const EMBEDDING_DEPLOYMENT: &str = "text-embedding-ada-002";
    pub const CONTENT_FIELD: &str = "content";
    pub const CONTENT_FIELDS_SEPARATOR: &str = "\n";
    pub const FILEPATH_FIELD: &str = "chunk_id";
    pub const URL_FIELD: &str = "sourceurl";
    pub const VECTOR_FIELD: &str = "contentVector";
    pub const STRICTNESS: u8 = 3;
    pub const TOP_N_DOCUMENTS: u32 = 5;
}

/// A retrieval data source attached to a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "parameters", rename_all = "snake_case")]
pub enum DataSource {
    /// Azure AI Search index.
    AzureSearch(AzureSearchParameters),
}

/// How the search index is queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// Keyword search.
    Simple,
    /// Semantic ranking over keyword search.
    Semantic,
    /// Pure vector search.
    Vector,
    /// Vector plus keyword search.
    VectorSimpleHybrid,
    /// Vector plus keyword search with semantic ranking.
    VectorSemanticHybrid,
}

/// Maps index fields onto the roles the service expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldsMapping {
    /// Separator placed between multiple content fields.
    pub content_fields_separator: String,
    /// Fields holding the chunk text.
    pub content_fields: Vec<String>,
    /// Field reported as the citation's file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filepath_field: Option<String>,
    /// Field reported as the citation's title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_field: Option<String>,
    /// Field reported as the citation's URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_field: Option<String>,
    /// Fields holding embeddings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vector_fields: Vec<String>,
}

impl Default for FieldsMapping {
    fn default() -> Self {
        Self {
            content_fields_separator: defaults::CONTENT_FIELDS_SEPARATOR.to_string(),
            content_fields: vec![defaults::CONTENT_FIELD.to_string()],
            filepath_field: Some(defaults::FILEPATH_FIELD.to_string()),
            title_field: Some(defaults::URL_FIELD.to_string()),
            url_field: Some(defaults::URL_FIELD.to_string()),
            vector_fields: vec![defaults::VECTOR_FIELD.to_string()],
        }
    }
}

/// Authentication the service uses against the search index.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchAuthentication {
    /// Admin or query key.
    ApiKey {
        /// The search key.
        key: String,
    },
}

impl fmt::Debug for SearchAuthentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey { key } => f
                .debug_struct("ApiKey")
                .field("key", &crate::config::mask_secret(key))
                .finish(),
        }
    }
}

/// Wire form of the `in_scope` switch: written as a string, read as either
/// a string or a boolean.
mod in_scope {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "true" } else { "false" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Flag::deserialize(deserializer)? {
            Flag::Bool(value) => Ok(value),
            Flag::Text(text) => Ok(text.eq_ignore_ascii_case("true")),
        }
    }
}

/// Embedding model used to vectorize the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmbeddingDependency {
    /// An embedding deployment in the same Azure OpenAI resource.
    DeploymentName {
        /// Deployment name.
        deployment_name: String,
    },
}

/// Parameters of an Azure AI Search data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AzureSearchParameters {
    /// Search service endpoint.
    pub endpoint: String,
    /// Index name.
    pub index_name: String,
    /// Semantic configuration name defined on the index.
    pub semantic_configuration: String,
    /// Query mode.
    pub query_type: QueryType,
    /// Field roles.
    pub fields_mapping: FieldsMapping,
    /// Restrict answers to the retrieved data. Sent as the string `"true"`
    /// or `"false"`.
    #[serde(with = "in_scope")]
    pub in_scope: bool,
    /// Persona forwarded to the retrieval step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_information: Option<String>,
    /// Relevance filter strictness (1-5).
    pub strictness: u8,
    /// Number of chunks fed to the model.
    pub top_n_documents: u32,
    /// Index authentication.
    pub authentication: SearchAuthentication,
    /// Query vectorization model.
    pub embedding_dependency: EmbeddingDependency,
}

impl AzureSearchParameters {
    /// Creates parameters for the given index with the transcript defaults:
    /// hybrid vector+keyword queries, strictness 3, five documents.
    pub fn new(
        endpoint: impl Into<String>,
        index_name: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            index_name: index_name.into(),
            semantic_configuration: defaults::SEMANTIC_CONFIGURATION.to_string(),
            query_type: QueryType::VectorSimpleHybrid,
            fields_mapping: FieldsMapping::default(),
            in_scope: true,
            role_information: None,
            strictness: defaults::STRICTNESS,
            top_n_documents: defaults::TOP_N_DOCUMENTS,
            authentication: SearchAuthentication::ApiKey {
                key: api_key.into(),
            },
            embedding_dependency: EmbeddingDependency::DeploymentName {
                deployment_name: defaults::EMBEDDING_DEPLOYMENT.to_string(),
            },
        }
    }

    /// Sets the semantic configuration name.
    pub fn with_semantic_configuration(mut self, name: impl Into<String>) -> Self {
        self.semantic_configuration = name.into();
        self
    }

    /// Sets the embedding deployment used for query vectorization.
    pub fn with_embedding_deployment(mut self, deployment_name: impl Into<String>) -> Self {
        self.embedding_dependency = EmbeddingDependency::DeploymentName {
            deployment_name: deployment_name.into(),
        };
        self
    }

    /// Sets the persona forwarded to the retrieval step.
    pub fn with_role_information(mut self, role_information: impl Into<String>) -> Self {
        self.role_information = Some(role_information.into());
        self
    }

    /// Sets the query mode.
    pub fn with_query_type(mut self, query_type: QueryType) -> Self {
        self.query_type = query_type;
        self
    }

    /// Wraps these parameters into a [`DataSource`].
    pub fn into_data_source(self) -> DataSource {
        DataSource::AzureSearch(self)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn azure_search_wire_shape() {
        let source = AzureSearchParameters::new("https://search.example.net", "transcripts", "k3y")
            .with_role_information("persona")
            .into_data_source();

        let value = serde_json::to_value(&source).unwrap();
        assert_eq!(value["type"], "azure_search");

        let params = &value["parameters"];
        assert_eq!(params["index_name"], "transcripts");
        assert_eq!(params["semantic_configuration"], "my-semantic-config");
        assert_eq!(params["query_type"], "vector_simple_hybrid");
        assert_eq!(params["strictness"], 3);
        assert_eq!(params["top_n_documents"], 5);
        assert_eq!(params["in_scope"], "true");
        assert_eq!(params["role_information"], "persona");
        assert_eq!(params["authentication"], json!({"type": "api_key", "key": "k3y"}));
        assert_eq!(
            params["embedding_dependency"],
            json!({"type": "deployment_name", "deployment_name": "text-embedding-ada-002"})
        );
    }

    #[test]
    fn in_scope_reads_string_or_bool() {
        let mut value =
            serde_json::to_value(AzureSearchParameters::new("https://s", "i", "k")).unwrap();
        let parsed: AzureSearchParameters = serde_json::from_value(value.clone()).unwrap();
        assert!(parsed.in_scope);

        value["in_scope"] = json!(false);
        let parsed: AzureSearchParameters = serde_json::from_value(value.clone()).unwrap();
        assert!(!parsed.in_scope);

        value["in_scope"] = json!("False");
        let parsed: AzureSearchParameters = serde_json::from_value(value).unwrap();
        assert!(!parsed.in_scope);
    }

    #[test]
    fn fields_mapping_reuses_url_as_title() {
        let mapping = FieldsMapping::default();
        assert_eq!(mapping.content_fields, vec!["content".to_string()]);
        assert_eq!(mapping.filepath_field.as_deref(), Some("chunk_id"));
        assert_eq!(mapping.title_field, mapping.url_field);
        assert_eq!(mapping.url_field.as_deref(), Some("sourceurl"));
        assert_eq!(mapping.vector_fields, vec!["contentVector".to_string()]);
    }

    #[test]
    fn search_key_is_masked_in_debug() {
        let params = AzureSearchParameters::new("https://s", "i", "supersecretkey");
        let debug = format!("{params:?}");
        assert!(!debug.contains("supersecretkey"));
        assert!(debug.contains("supe****"));
    }
}
