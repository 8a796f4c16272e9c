use std::sync::Arc;

use rmcp::{
    ServerHandler,
    ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult,
        Content,
        Implementation,
        ServerCapabilities,
        ServerInfo,
    },
    tool,
    tool_handler,
    tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    catalog::{ServiceFilter, ServiceRecord, filter_services},
    data_dir::DataDir,
    error,
    filter::{Facet, FilterCriteria},
    format::{DocumentListing, documents_summary, services_summary},
    store::RecordStore,
    view::DocumentView,
};

const DEFAULT_DOCUMENT_LIMIT: usize = 20;

struct CartorioState {
    store: RecordStore,
}

#[derive(Clone)]
pub struct CartorioMcpServer {
    state: Arc<CartorioState>,
    tool_router: ToolRouter<Self>,
}

impl CartorioMcpServer {
    fn new(state: CartorioState) -> Self {
        Self {
            state: Arc::new(state),
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router(router = tool_router)]
impl CartorioMcpServer {
    /// Filter stored documents by text, status and type.
    #[tool(
        name = "cartorio_documents",
        description = "Search stored documents by name, client, service or extracted text. Supports status and type facets and returns matching excerpts."
    )]
    pub async fn cartorio_documents(
        &self,
        params: Parameters<DocumentSearchParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;

        let criteria = FilterCriteria {
            query: params.query.unwrap_or_default(),
            status: parse_facet(params.status.as_deref())?,
            doc_type: parse_facet(params.doc_type.as_deref())?,
        };

        let documents = self
            .state
            .store
            .list_documents()
            .map_err(|e| mcp_error("failed to load documents", e))?;
        let view = DocumentView::new(documents, criteria);

        let limit = params.limit.unwrap_or(DEFAULT_DOCUMENT_LIMIT);
        let mut listing = DocumentListing::from_view(&view, Some(limit));
        if !params.include_snippet.unwrap_or(true) {
            for item in &mut listing.results {
                item.snippet = None;
            }
        }

        let summary = documents_summary(&listing);
        let structured = serde_json::to_value(&listing)
            .map_err(|e| mcp_error("failed to serialize documents", e))?;

        let mut result = CallToolResult::success(vec![Content::text(summary)]);
        result.structured_content = Some(structured);
        Ok(result)
    }

    /// List the service catalog, optionally filtered.
    #[tool(
        name = "cartorio_services",
        description = "List services offered by the office, filtered by name and attribution."
    )]
    pub async fn cartorio_services(
        &self,
        params: Parameters<ServiceSearchParams>,
    ) -> Result<CallToolResult, rmcp::ErrorData> {
        let params = params.0;

        let filter = ServiceFilter {
            query: params.query.unwrap_or_default(),
            attribution: parse_facet(params.attribution.as_deref())?,
        };

        let services = self
            .state
            .store
            .list_services()
            .map_err(|e| mcp_error("failed to load services", e))?;
        let matched: Vec<&ServiceRecord> = filter_services(&services, &filter);

        let summary = services_summary(&matched);
        let structured = serde_json::to_value(ServiceResponse {
            result_count: matched.len(),
            results: matched,
        })
        .map_err(|e| mcp_error("failed to serialize services", e))?;

        let mut result = CallToolResult::success(vec![Content::text(summary)]);
        result.structured_content = Some(structured);
        Ok(result)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for CartorioMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_server_info(
                Implementation::new("cartorio", env!("CARGO_PKG_VERSION"))
                    .with_title("cartorio MCP"),
            )
            .with_instructions(
                "Use cartorio_documents to find stored documents and cartorio_services to browse the service catalog.",
            )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSearchParams {
    /// Free-text query over name, client, service and extracted text.
    pub query: Option<String>,
    /// Status facet: All, Concluído, Pendente or Processando.
    pub status: Option<String>,
    /// Type facet: All, pdf, docx or jpg.
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    /// Maximum number of results (default: 20).
    pub limit: Option<usize>,
    /// Include an excerpt around the match (default: true).
    pub include_snippet: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSearchParams {
    /// Match against the service name.
    pub query: Option<String>,
    /// Attribution facet, e.g. "Registro Civil", or All.
    pub attribution: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ServiceResponse<'a> {
    result_count: usize,
    results: Vec<&'a ServiceRecord>,
}

fn parse_facet<T>(value: Option<&str>) -> Result<Facet<T>, rmcp::ErrorData>
where
    T: std::str::FromStr<Err = String>,
{
    match value {
        Some(v) => v
            .parse()
            .map_err(|e: String| rmcp::ErrorData::invalid_params(e, None)),
        None => Ok(Facet::All),
    }
}

fn mcp_error(message: &str, error: impl std::fmt::Display) -> rmcp::ErrorData {
    rmcp::ErrorData::internal_error(
        message.to_string(),
        Some(json!({ "error": error.to_string() })),
    )
}

pub fn run_mcp(data_dir: &DataDir) -> error::Result<()> {
    let store = RecordStore::open(&data_dir.records_db())?;
    let server = CartorioMcpServer::new(CartorioState { store });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            error::Error::Config(format!("failed to start tokio runtime: {e}"))
        })?;

    runtime.block_on(async move {
        let transport = rmcp::transport::stdio();
        let running = server.serve(transport).await.map_err(|e| {
            error::Error::Config(format!(
                "MCP server initialization failed: {e}"
            ))
        })?;
        running.waiting().await.map_err(|e| {
            error::Error::Config(format!("MCP server error: {e}"))
        })?;
        Ok(())
    })
}
