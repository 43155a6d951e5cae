//! HTTP request handlers.
//!
//! Handlers validate query parameters, delegate to the zoning and
//! rendering crates, and translate domain errors into HTTP statuses:
//! missing parameters are 400, unknown or data-less communes are 404,
//! store failures are logged and returned as 500 without leaking the
//! underlying message.

use actix_web::{HttpResponse, web};
use prix_map_geography_models::NiveauGeographique;
use prix_map_server_models::{
    ApiCommuneLimitrophe, ApiHealth, ApiPrixM2, ApiZone, CommuneQueryParams, PrixM2QueryParams,
    RenderParamsQueryParams,
};
use prix_map_stats::SummaryOptions;
use prix_map_transaction_models::TypeLocal;
use prix_map_zoning::{ZoningError, compute_prix_m2_par_type, compute_zone_statistics};
use serde_json::json;

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/stats-zones?code_commune=`
///
/// Zoned price statistics for one commune. Only zones with data are
/// returned; a commune where no zone qualifies is a 404, not an empty
/// list.
#[allow(clippy::future_not_send)]
pub async fn stats_zones(
    state: web::Data<AppState>,
    query: web::Query<CommuneQueryParams>,
) -> HttpResponse {
    let Some(code_commune) = &query.code_commune else {
        return HttpResponse::BadRequest().json(json!({"error": "code_commune is required"}));
    };

    match compute_zone_statistics(state.store.as_ref(), code_commune, &state.config).await {
        Ok(zones) => {
            HttpResponse::Ok().json(zones.into_iter().map(ApiZone::from).collect::<Vec<_>>())
        }
        Err(
            e @ (ZoningError::CommuneNotFound { .. }
            | ZoningError::NoGeometry { .. }
            | ZoningError::NoData { .. }),
        ) => HttpResponse::NotFound().json(json!({"error": e.to_string()})),
        Err(ZoningError::Store(e)) => {
            log::error!("Zone statistics failed for {code_commune}: {e:?}");
            HttpResponse::InternalServerError().json(json!({"error": "Internal server error"}))
        }
    }
}

/// `GET /api/prix-m2?niveau=&code=&type_local=`
///
/// Per-type price/m² summaries at a geographic level. Types below the
/// sample minimum are absent from the rows rather than zero-filled.
#[allow(clippy::future_not_send)]
pub async fn prix_m2(
    state: web::Data<AppState>,
    query: web::Query<PrixM2QueryParams>,
) -> HttpResponse {
    let (Some(niveau), Some(code)) = (&query.niveau, &query.code) else {
        return HttpResponse::BadRequest().json(json!({"error": "niveau and code are required"}));
    };
    let Ok(niveau) = niveau.parse::<NiveauGeographique>() else {
        return HttpResponse::BadRequest()
            .json(json!({"error": "niveau must be commune, departement, or region"}));
    };

    let mut options = SummaryOptions::default();
    if let Some(raw) = &query.type_local {
        let Ok(type_local) = raw.parse::<TypeLocal>() else {
            return HttpResponse::BadRequest().json(json!({"error": "Unknown type_local"}));
        };
        options.types = Some(vec![type_local]);
    }

    match compute_prix_m2_par_type(state.store.as_ref(), niveau, code, &options).await {
        Ok(rows) => {
            HttpResponse::Ok().json(rows.into_iter().map(ApiPrixM2::from).collect::<Vec<_>>())
        }
        Err(e) => {
            log::error!("Price summary failed for {niveau} {code}: {e:?}");
            HttpResponse::InternalServerError().json(json!({"error": "Internal server error"}))
        }
    }
}

/// `GET /api/render-params?zoom=`
pub async fn render_params(query: web::Query<RenderParamsQueryParams>) -> HttpResponse {
    let Some(zoom) = query.zoom else {
        return HttpResponse::BadRequest().json(json!({"error": "zoom is required"}));
    };
    HttpResponse::Ok().json(prix_map_render::render_params_for_zoom(zoom))
}

/// `GET /api/communes-limitrophes?code_commune=`
///
/// Adjacent-commune boundaries, relayed as raw GeoJSON strings. An
/// isolated commune legitimately returns an empty list.
#[allow(clippy::future_not_send)]
pub async fn communes_limitrophes(
    state: web::Data<AppState>,
    query: web::Query<CommuneQueryParams>,
) -> HttpResponse {
    let Some(code_commune) = &query.code_commune else {
        return HttpResponse::BadRequest().json(json!({"error": "code_commune is required"}));
    };

    match state.store.fetch_adjacent_communes(code_commune).await {
        Ok(communes) => HttpResponse::Ok().json(
            communes
                .into_iter()
                .map(ApiCommuneLimitrophe::from)
                .collect::<Vec<_>>(),
        ),
        Err(e) => {
            log::error!("Adjacent communes fetch failed for {code_commune}: {e:?}");
            HttpResponse::InternalServerError().json(json!({"error": "Internal server error"}))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, test};
    use chrono::NaiveDate;
    use prix_map_database::MemoryStore;
    use prix_map_geography_models::Commune;
    use prix_map_render::RenderParams;
    use prix_map_transaction_models::Transaction;
    use prix_map_zoning::ZoningConfig;

    use super::*;

    fn commune(code: &str, nom: &str, geometrie: Option<String>) -> Commune {
        Commune {
            code_commune: code.to_string(),
            nom_commune: nom.to_string(),
            code_departement: "06".to_string(),
            surface_ha: Some(300.0),
            geometrie,
        }
    }

    fn square_geometry() -> String {
        r#"{"type":"Polygon","coordinates":[[[0.0,0.0],[0.01,0.0],[0.01,0.01],[0.0,0.01],[0.0,0.0]]]}"#
            .to_string()
    }

    fn transaction(id: i64, lon: f64, lat: f64) -> Transaction {
        Transaction {
            id,
            date_mutation: NaiveDate::from_ymd_opt(2024, 4, 10).unwrap(),
            valeur_fonciere: 300_000.0,
            surface_reelle_bati: Some(60.0),
            longitude: Some(lon),
            latitude: Some(lat),
            type_local: Some(TypeLocal::Appartement),
            code_commune: "06088".to_string(),
            code_departement: "06".to_string(),
            code_postal: Some("06000".to_string()),
        }
    }

    fn seeded_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.insert_commune(commune("06088", "Nice", Some(square_geometry())));
        store.insert_commune(commune("06159", "Villefranche-sur-Mer", Some(square_geometry())));
        store.insert_adjacency("06088", "06159");
        let spots = [
            (0.002, 0.002),
            (0.003, 0.002),
            (0.007, 0.003),
            (0.008, 0.002),
            (0.002, 0.008),
            (0.003, 0.007),
            (0.007, 0.008),
            (0.008, 0.007),
            (0.004, 0.004),
            (0.006, 0.006),
        ];
        store.insert_transactions(
            spots
                .iter()
                .enumerate()
                .map(|(i, &(lon, lat))| transaction(i64::try_from(i).unwrap(), lon, lat)),
        );
        store
    }

    async fn request(store: MemoryStore, path: &str) -> (u16, serde_json::Value) {
        let state = web::Data::new(AppState {
            store: Arc::new(store),
            config: ZoningConfig::default(),
        });
        let app = test::init_service(
            App::new()
                .app_data(state)
                .route("/api/health", web::get().to(health))
                .route("/api/stats-zones", web::get().to(stats_zones))
                .route("/api/prix-m2", web::get().to(prix_m2))
                .route("/api/render-params", web::get().to(render_params))
                .route(
                    "/api/communes-limitrophes",
                    web::get().to(communes_limitrophes),
                ),
        )
        .await;

        let req = test::TestRequest::get().uri(path).to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status().as_u16();
        let body = test::read_body(resp).await;
        let value = serde_json::from_slice(&body).unwrap();
        (status, value)
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let (status, body) = request(MemoryStore::new(), "/api/health").await;
        assert_eq!(status, 200);
        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn stats_zones_requires_code_commune() {
        let (status, body) = request(seeded_store(), "/api/stats-zones").await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "code_commune is required");
    }

    #[actix_web::test]
    async fn stats_zones_unknown_commune_is_404() {
        let (status, _) = request(seeded_store(), "/api/stats-zones?code_commune=00000").await;
        assert_eq!(status, 404);
    }

    #[actix_web::test]
    async fn stats_zones_returns_grid_zones() {
        let (status, body) = request(seeded_store(), "/api/stats-zones?code_commune=06088").await;
        assert_eq!(status, 200);
        let zones = body.as_array().unwrap();
        assert_eq!(zones.len(), 4);
        assert_eq!(zones[0]["codeCommune"], "06088");
        assert_eq!(zones[0]["prixMoyenM2"], 5000);
        assert!(
            zones[0]["nomZone"]
                .as_str()
                .unwrap()
                .starts_with("Zone ")
        );
    }

    #[actix_web::test]
    async fn prix_m2_rejects_unknown_niveau() {
        let (status, _) = request(seeded_store(), "/api/prix-m2?niveau=canton&code=06").await;
        assert_eq!(status, 400);
    }

    #[actix_web::test]
    async fn prix_m2_summarizes_per_type() {
        let (status, body) =
            request(seeded_store(), "/api/prix-m2?niveau=commune&code=06088").await;
        assert_eq!(status, 200);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["typeLogement"], "Appartement");
        assert_eq!(rows[0]["prixM2Median"], 5000);
        assert_eq!(rows[0]["nbTransactions"], 10);
    }

    #[actix_web::test]
    async fn render_params_follows_zoom_table() {
        let (status, body) = request(MemoryStore::new(), "/api/render-params?zoom=12").await;
        assert_eq!(status, 200);
        let params: RenderParams = serde_json::from_value(body).unwrap();
        assert_eq!(
            params,
            RenderParams {
                radius: 12,
                blur: 8
            }
        );
    }

    #[actix_web::test]
    async fn communes_limitrophes_lists_neighbors() {
        let (status, body) =
            request(seeded_store(), "/api/communes-limitrophes?code_commune=06088").await;
        assert_eq!(status, 200);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["codeCommune"], "06159");
        assert_eq!(rows[0]["nomCommune"], "Villefranche-sur-Mer");
    }
}
