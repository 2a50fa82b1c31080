//! Unified dispatcher
//!
//! Fans one query out over the C++ index and the live service, runs the
//! domains concurrently and merges them into one envelope. A failing
//! domain is reported next to the others and never aborts them.
//!
//! @module dispatch

pub mod envelope;

pub use envelope::{
    DetailsReport, DomainError, DomainOutcome, HierarchyReport, LiveMatches, ReferenceList,
    ReferenceReport, UnifiedRequest, UnifiedResponse,
};

use std::sync::Arc;
use tracing::{debug, info};

use crate::client::{AssetRef, IntrospectionClient, LiveService};
use crate::core::config::TraceConfig;
use crate::core::domain::Domain;
use crate::core::error::{Error, Result};
use crate::query::{QueryEngine, QueryMode, SearchRequest, SearchResult};
use crate::scope::SearchScope;
use crate::trace::{DirectionFilter, ReferenceNode, TraceOptions, TraceResult, Tracer, UsageReport};

pub struct Dispatcher<S> {
    engine: Arc<QueryEngine>,
    client: Option<IntrospectionClient<S>>,
    trace: TraceConfig,
}

impl<S: LiveService> Dispatcher<S> {
    /// `client` is `None` in C++-only mode
    pub fn new(engine: Arc<QueryEngine>, client: Option<IntrospectionClient<S>>, trace: TraceConfig) -> Self {
        Self {
            engine,
            client,
            trace,
        }
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    pub fn client(&self) -> Option<&IntrospectionClient<S>> {
        self.client.as_ref()
    }

    pub fn is_live(&self) -> bool {
        self.client.is_some()
    }

    pub fn trace_options(&self) -> TraceOptions {
        TraceOptions::from_config(&self.trace)
    }

    // =========================================================================
    // SEARCH
    // =========================================================================

    pub async fn search(&self, request: &UnifiedRequest) -> UnifiedResponse {
        let mut domains: Vec<Domain> = Vec::new();
        for domain in &request.domains {
            if !domains.contains(domain) {
                domains.push(*domain);
            }
        }

        let mut warnings = Vec::new();
        if self.client.is_none() && domains.iter().any(Domain::is_live) {
            warnings.push(
                "Live service is not configured; blueprint and asset domains were skipped".to_string(),
            );
            domains.retain(|d| !d.is_live());
        }

        let scope = self.scope_of(request.search.scope.as_deref());
        let (cpp, blueprint, asset) = tokio::join!(
            self.search_cpp(domains.contains(&Domain::Cpp), &request.search),
            self.search_live(Domain::Blueprint, domains.contains(&Domain::Blueprint), request, scope),
            self.search_live(Domain::Asset, domains.contains(&Domain::Asset), request, scope),
        );

        let mut errors = Vec::new();
        let mut total_count = 0;
        if let Some(outcome) = &cpp {
            match outcome {
                DomainOutcome::Found(result) => total_count += result.total_count,
                DomainOutcome::Failed(error) => errors.push(error.clone()),
                DomainOutcome::NotFound { .. } => {}
            }
        }
        for outcome in [&blueprint, &asset].into_iter().flatten() {
            match outcome {
                DomainOutcome::Found(matches) => total_count += matches.count,
                DomainOutcome::Failed(error) => errors.push(error.clone()),
                DomainOutcome::NotFound { .. } => {}
            }
        }

        let tips = if total_count == 0 {
            empty_result_tips(&request.search, &domains)
        } else {
            Vec::new()
        };

        info!(
            query = %request.search.query,
            scope = %scope,
            domains = domains.len(),
            total = total_count,
            failed = errors.len(),
            "Unified search complete"
        );

        UnifiedResponse {
            query: request.search.query.clone(),
            scope,
            domains_searched: domains,
            ok: errors.is_empty(),
            total_count,
            cpp,
            blueprint,
            asset,
            errors,
            warnings,
            tips,
        }
    }

    async fn search_cpp(&self, enabled: bool, request: &SearchRequest) -> Option<DomainOutcome<SearchResult>> {
        if !enabled {
            return None;
        }
        let query = request.query.clone();
        let request = request.clone();
        let result = self.blocking(move |engine| engine.search(&request)).await;
        Some(DomainOutcome::from_listing(Domain::Cpp, &query, result, |r| {
            r.total_count == 0
        }))
    }

    async fn search_live(
        &self,
        domain: Domain,
        enabled: bool,
        request: &UnifiedRequest,
        scope: SearchScope,
    ) -> Option<DomainOutcome<LiveMatches>> {
        if !enabled {
            return None;
        }
        let client = self.client.as_ref()?;
        let filter = match domain {
            Domain::Blueprint => request.class_filter.as_deref(),
            _ => request.asset_type.as_deref(),
        };

        let result = client
            .search(domain, &request.search.query, filter)
            .await
            .map(|found| {
                let mut matches: Vec<AssetRef> = found
                    .into_iter()
                    .filter(|m| in_scope(domain, scope, m))
                    .collect();
                let limit = request.search.max_results;
                let truncated = matches.len() > limit;
                matches.truncate(limit);
                LiveMatches {
                    count: matches.len(),
                    matches,
                    truncated,
                }
            });
        Some(DomainOutcome::from_listing(domain, &request.search.query, result, |m| {
            m.matches.is_empty()
        }))
    }

    // =========================================================================
    // SINGLE ENTITY
    // =========================================================================

    /// C++ class hierarchy, or Blueprint hierarchy from the live service
    pub async fn hierarchy(
        &self,
        name: &str,
        domain: Domain,
        scope: Option<&str>,
        include_interfaces: bool,
    ) -> DomainOutcome<HierarchyReport> {
        match domain {
            Domain::Cpp => {
                let name = name.to_string();
                let scope = scope.map(str::to_string);
                let result = self
                    .blocking(move |engine| engine.hierarchy(&name, include_interfaces, scope.as_deref()))
                    .await;
                match result {
                    Ok(lookup) => DomainOutcome::from(lookup).map(HierarchyReport::Cpp),
                    Err(e) => DomainOutcome::Failed(DomainError::new(domain, &e)),
                }
            }
            Domain::Blueprint => {
                let result = match self.live(domain) {
                    Ok(client) => client.blueprint_hierarchy(name).await,
                    Err(e) => Err(e),
                };
                DomainOutcome::from_result(domain, result.map(HierarchyReport::Live))
            }
            Domain::Asset => DomainOutcome::Failed(DomainError::new(
                domain,
                &Error::InvalidQuery {
                    message: "hierarchy is available for cpp and blueprint only".to_string(),
                },
            )),
        }
    }

    /// References of a C++ identifier or a Blueprint/asset path
    ///
    /// C++ answers incoming references only.
    pub async fn references(
        &self,
        path: &str,
        domain: Domain,
        direction: DirectionFilter,
        scope: Option<&str>,
    ) -> DomainOutcome<ReferenceReport> {
        let mut report = ReferenceReport {
            path: path.to_string(),
            domain,
            direction,
            outgoing: None,
            incoming: None,
        };

        let result = match domain {
            Domain::Cpp => {
                if direction.incoming() {
                    let identifier = path.to_string();
                    let scope = scope.map(str::to_string);
                    self.blocking(move |engine| engine.references(&identifier, scope.as_deref()))
                        .await
                        .map(|found| report.incoming = Some(ReferenceList::Source(found)))
                } else {
                    Ok(())
                }
            }
            Domain::Blueprint | Domain::Asset => self.live_references(path, domain, direction, &mut report).await,
        };

        DomainOutcome::from_listing(domain, path, result.map(|()| report), ReferenceReport::is_empty)
    }

    async fn live_references(
        &self,
        path: &str,
        domain: Domain,
        direction: DirectionFilter,
        report: &mut ReferenceReport,
    ) -> Result<()> {
        let client = self.live(domain)?;
        if direction.outgoing() {
            report.outgoing = Some(ReferenceList::Live(client.outgoing(domain, path).await?));
        }
        if direction.incoming() {
            report.incoming = Some(ReferenceList::Live(client.incoming(domain, path).await?));
        }
        Ok(())
    }

    /// C++ class details, Blueprint details or asset metadata
    pub async fn details(
        &self,
        path: &str,
        domain: Domain,
        scope: Option<&str>,
        include_inherited: bool,
    ) -> DomainOutcome<DetailsReport> {
        match domain {
            Domain::Cpp => {
                let name = path.to_string();
                let scope = scope.map(str::to_string);
                let result = self
                    .blocking(move |engine| engine.details(&name, include_inherited, scope.as_deref()))
                    .await;
                match result {
                    Ok(lookup) => DomainOutcome::from(lookup).map(DetailsReport::Cpp),
                    Err(e) => DomainOutcome::Failed(DomainError::new(domain, &e)),
                }
            }
            Domain::Blueprint | Domain::Asset => {
                let result = match self.live(domain) {
                    Ok(client) => client.details(domain, path).await,
                    Err(e) => Err(e),
                };
                DomainOutcome::from_result(domain, result.map(DetailsReport::Live))
            }
        }
    }

    // =========================================================================
    // TRACE
    // =========================================================================

    pub async fn trace(&self, seed: ReferenceNode, options: &TraceOptions) -> Result<TraceResult> {
        Tracer::new(&self.engine, self.client.as_ref())
            .trace(seed, options)
            .await
    }

    pub async fn find_usage(&self, class_name: &str, options: &TraceOptions) -> Result<UsageReport> {
        Tracer::new(&self.engine, self.client.as_ref())
            .find_usage(class_name, options)
            .await
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn scope_of(&self, scope: Option<&str>) -> SearchScope {
        let resolver = self.engine.resolver();
        match scope {
            Some(scope) => resolver.parse_scope(scope),
            None => resolver.default_scope(),
        }
    }

    fn live(&self, domain: Domain) -> Result<&IntrospectionClient<S>> {
        self.client
            .as_ref()
            .ok_or(Error::ServiceNotConfigured { domain })
    }

    /// Run index work on the blocking pool
    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&QueryEngine) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        match tokio::task::spawn_blocking(move || f(&engine)).await {
            Ok(result) => result,
            Err(e) => {
                debug!(error = %e, "Index task failed");
                Err(Error::IndexError {
                    message: format!("index task failed: {}", e),
                })
            }
        }
    }
}

/// Native packages count as engine side; assets also treat `/Engine/` so
fn in_scope(domain: Domain, scope: SearchScope, entry: &AssetRef) -> bool {
    let engine_side = entry.is_native() || (domain == Domain::Asset && entry.is_engine_content());
    match scope {
        SearchScope::Project => !engine_side,
        SearchScope::Engine => engine_side,
        SearchScope::Plugin | SearchScope::All => true,
    }
}

fn empty_result_tips(request: &SearchRequest, domains: &[Domain]) -> Vec<String> {
    let mut tips = Vec::new();
    let multi_word = request.query.split_whitespace().count() > 1;
    if domains.contains(&Domain::Cpp)
        && matches!(request.mode, QueryMode::Smart | QueryMode::Tokens)
        && multi_word
    {
        tips.push(
            "C++ search splits the query on whitespace and ranks files by matched tokens; \
             try fewer keywords, e.g. GameplayAbility, Damage or Execution"
                .to_string(),
        );
    }
    if domains.iter().any(Domain::is_live) {
        tips.push(
            "Blueprint and asset search match names by wildcard; \
             try keywords closer to asset names (GA_, GE_, B_, BP_)"
                .to_string(),
        );
    }
    tips
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::StaticService;
    use crate::client::{HttpService, ServiceOperation};
    use crate::core::config::{IndexConfig, SearchConfig};
    use crate::index::IndexStore;
    use crate::scope::{ScopeResolver, SourceOrigin};
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;
    use url::Url;

    fn engine() -> (TempDir, Arc<QueryEngine>) {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("Health.h"),
            "UCLASS()\nclass UHealthComponent : public UActorComponent\n{\n    UPROPERTY(EditAnywhere)\n    float Health;\n};\n",
        )
        .unwrap();
        let mut resolver = ScopeResolver::new(SearchScope::Project);
        resolver.register(temp.path(), SourceOrigin::ProjectSource).unwrap();
        let store = Arc::new(IndexStore::new(&IndexConfig::default()).unwrap());
        let engine = QueryEngine::new(store, Arc::new(resolver), &SearchConfig::default());
        (temp, Arc::new(engine))
    }

    fn dispatcher(service: StaticService) -> (TempDir, Dispatcher<StaticService>) {
        let (temp, engine) = engine();
        let client = IntrospectionClient::new(service);
        (temp, Dispatcher::new(engine, Some(client), TraceConfig::default()))
    }

    fn hero_matches() -> StaticService {
        StaticService::new()
            .respond(
                ServiceOperation::BlueprintSearch,
                "Hero",
                json!({"matches": [
                    {"path": "/Game/BP_Hero", "class": "Blueprint"},
                    {"path": "/Game/BP_HeroBoss", "class": "Blueprint"},
                    {"path": "/Script/Game.HeroNative", "class": "Blueprint"}
                ]}),
            )
            .respond(
                ServiceOperation::AssetSearch,
                "Hero",
                json!({"matches": [
                    "/Game/Meshes/SM_Hero",
                    "/Engine/Meshes/SM_HeroDefault"
                ]}),
            )
    }

    #[tokio::test]
    async fn test_unreachable_service_isolated_per_domain() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let url = Url::parse(&format!("http://{}", addr)).unwrap();
        let service = HttpService::new(url, Duration::from_secs(2));

        let (_temp, engine) = engine();
        let dispatcher = Dispatcher::new(engine, Some(IntrospectionClient::new(service)), TraceConfig::default());

        let response = dispatcher
            .search(&UnifiedRequest::new(SearchRequest::new("Health")))
            .await;

        assert!(!response.ok);
        assert_eq!(response.domains_searched, Domain::ALL.to_vec());
        assert_eq!(response.total_count, 1);
        assert_eq!(response.cpp.as_ref().unwrap().found().unwrap().total_count, 1);
        assert!(response.blueprint.as_ref().unwrap().error().is_some());
        assert!(response.asset.as_ref().unwrap().error().is_some());
        let failed: Vec<Domain> = response.errors.iter().map(|e| e.domain).collect();
        assert_eq!(failed, vec![Domain::Blueprint, Domain::Asset]);
        assert!(response.tips.is_empty());
    }

    #[tokio::test]
    async fn test_live_scope_filter_and_truncation() {
        let (_temp, dispatcher) = dispatcher(hero_matches());

        let request = UnifiedRequest::new(SearchRequest::new("Hero"))
            .domains(vec![Domain::Blueprint, Domain::Asset]);
        let response = dispatcher.search(&request).await;
        assert!(response.ok);
        let blueprints = response.blueprint.as_ref().unwrap().found().unwrap();
        assert_eq!(blueprints.count, 2);
        let assets = response.asset.as_ref().unwrap().found().unwrap();
        assert_eq!(assets.matches[0].name, "SM_Hero");
        assert_eq!(assets.count, 1);
        assert_eq!(response.total_count, 3);
        assert!(response.cpp.is_none());

        let request = UnifiedRequest::new(SearchRequest::new("Hero").scope("engine"))
            .domains(vec![Domain::Blueprint, Domain::Asset]);
        let response = dispatcher.search(&request).await;
        assert_eq!(response.scope, SearchScope::Engine);
        assert_eq!(response.blueprint.as_ref().unwrap().found().unwrap().count, 1);
        assert_eq!(response.asset.as_ref().unwrap().found().unwrap().count, 1);

        let request = UnifiedRequest::new(SearchRequest::new("Hero").scope("all").max_results(2))
            .domains(vec![Domain::Blueprint]);
        let response = dispatcher.search(&request).await;
        let blueprints = response.blueprint.as_ref().unwrap().found().unwrap();
        assert_eq!(blueprints.count, 2);
        assert!(blueprints.truncated);
    }

    #[tokio::test]
    async fn test_class_filter_is_forwarded() {
        let (_temp, dispatcher) = dispatcher(StaticService::new());
        let request = UnifiedRequest::new(SearchRequest::new("*"))
            .domains(vec![Domain::Blueprint])
            .class_filter("Pawn");
        dispatcher.search(&request).await;

        let calls = dispatcher.client().unwrap().service().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].get("class"), Some("Pawn"));
    }

    #[tokio::test]
    async fn test_cpp_only_mode_skips_live_domains() {
        let (_temp, engine) = engine();
        let dispatcher: Dispatcher<HttpService> = Dispatcher::new(engine, None, TraceConfig::default());

        let response = dispatcher
            .search(&UnifiedRequest::new(SearchRequest::new("Health")))
            .await;
        assert!(response.ok);
        assert_eq!(response.domains_searched, vec![Domain::Cpp]);
        assert_eq!(response.warnings.len(), 1);

        let details = dispatcher.details("/Game/BP_X", Domain::Blueprint, None, false).await;
        assert_eq!(details.error().unwrap().domain, Domain::Blueprint);
    }

    #[tokio::test]
    async fn test_tips_on_empty_result() {
        let (_temp, dispatcher) = dispatcher(StaticService::new());
        let response = dispatcher
            .search(&UnifiedRequest::new(SearchRequest::new("Zebra Quokka")))
            .await;
        assert!(response.ok);
        assert_eq!(response.total_count, 0);
        assert_eq!(response.tips.len(), 2);
        for outcome in [response.blueprint.as_ref(), response.asset.as_ref()] {
            assert!(outcome.unwrap().is_not_found());
        }
        let cpp = response.cpp.as_ref().unwrap();
        assert!(matches!(cpp, DomainOutcome::NotFound { name } if name == "Zebra Quokka"));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["cpp"]["status"], "not_found");
    }

    #[tokio::test]
    async fn test_single_entity_routing() {
        let service = StaticService::new()
            .respond(
                ServiceOperation::AssetReferences,
                "/Game/M_Skin",
                json!({"references": ["/Game/T_Skin"]}),
            )
            .respond(
                ServiceOperation::BlueprintHierarchy,
                "/Game/BP_Hero",
                json!({"ok": true, "parent_class": "Character"}),
            );
        let (_temp, dispatcher) = dispatcher(service);

        let hierarchy = dispatcher
            .hierarchy("UHealthComponent", Domain::Cpp, None, true)
            .await;
        assert!(matches!(hierarchy.found(), Some(HierarchyReport::Cpp(_))));

        let missing = dispatcher.hierarchy("UMissing", Domain::Cpp, None, true).await;
        assert!(matches!(missing, DomainOutcome::NotFound { .. }));

        let live = dispatcher.hierarchy("/Game/BP_Hero", Domain::Blueprint, None, true).await;
        match live.found() {
            Some(HierarchyReport::Live(value)) => assert_eq!(value["parent_class"], "Character"),
            other => panic!("unexpected: {:?}", other),
        }

        let refs = dispatcher
            .references("/Game/M_Skin", Domain::Asset, DirectionFilter::Outgoing, None)
            .await;
        let report = refs.found().unwrap();
        assert_eq!(report.outgoing.as_ref().unwrap().len(), 1);
        assert!(report.incoming.is_none());

        let cpp_refs = dispatcher
            .references("UActorComponent", Domain::Cpp, DirectionFilter::Both, None)
            .await;
        let report = cpp_refs.found().unwrap();
        assert!(report.outgoing.is_none());
        assert_eq!(report.incoming.as_ref().unwrap().len(), 1);

        let unused = dispatcher
            .references("UNobodyUsesThis", Domain::Cpp, DirectionFilter::Both, None)
            .await;
        assert!(unused.is_not_found());
        let orphan = dispatcher
            .references("/Game/M_Orphan", Domain::Asset, DirectionFilter::Both, None)
            .await;
        assert!(matches!(orphan, DomainOutcome::NotFound { name } if name == "/Game/M_Orphan"));

        let details = dispatcher.details("UHealthComponent", Domain::Cpp, None, true).await;
        match details.found() {
            Some(DetailsReport::Cpp(details)) => assert_eq!(details.properties.len(), 1),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
