use axum::{extract::State, Json};
use serde::Serialize;

use crate::admin::AdminState;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub pools: usize,
}

#[derive(Debug, Serialize)]
pub struct TargetStatus {
    pub member: String,
    pub latency_ms: f64,
}

#[derive(Debug, Serialize)]
pub struct PoolStatus {
    pub name: String,
    pub tag: String,
    pub members: Vec<String>,
    pub selected: Option<TargetStatus>,
    pub last_cycle_probed: Option<usize>,
    pub last_cycle_healthy: Option<usize>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        pools: state.pools.len(),
    })
}

pub async fn get_pools(State(state): State<AdminState>) -> Json<Vec<PoolStatus>> {
    let statuses = state
        .pools
        .all()
        .iter()
        .map(|pool| {
            let cycle = pool.last_cycle();
            PoolStatus {
                name: pool.name().to_string(),
                tag: pool.tag().to_string(),
                members: pool.members().iter().map(|m| m.to_string()).collect(),
                selected: pool.selected().map(|t| TargetStatus {
                    member: t.member.to_string(),
                    latency_ms: t.latency.as_secs_f64() * 1000.0,
                }),
                last_cycle_probed: cycle.map(|c| c.probed),
                last_cycle_healthy: cycle.map(|c| c.healthy),
            }
        })
        .collect();

    Json(statuses)
}
