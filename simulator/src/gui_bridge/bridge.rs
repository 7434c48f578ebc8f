use crate::gui_bridge::model::{ErrorReply, PositionReport, SensorReport, StepReport};
use artwalkcore::catalog::{DiscoveryEvent, DiscoveryNotice, PositionSample, StepSample};
use artwalkcore::prelude::{EngineError, EngineResult, SampleSink};
use artwalkcore::processing::EngineHandle;
use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::net::SocketAddr;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::Filter;

type JsonReply = WithStatus<Json>;

fn ok<T: Serialize>(body: &T) -> JsonReply {
    warp::reply::with_status(warp::reply::json(body), StatusCode::OK)
}

fn error_reply(err: &EngineError) -> JsonReply {
    let status = match err {
        EngineError::Precondition(_) => StatusCode::CONFLICT,
        EngineError::SensorUnavailable(_) | EngineError::Closed => StatusCode::SERVICE_UNAVAILABLE,
        EngineError::InvalidCatalog(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warp::reply::with_status(
        warp::reply::json(&ErrorReply {
            status: "error".into(),
            error: err.to_string(),
        }),
        status,
    )
}

fn respond<T: Serialize>(result: EngineResult<T>) -> JsonReply {
    match result {
        Ok(body) => ok(&body),
        Err(err) => {
            warn!("bridge request failed: {}", err);
            error_reply(&err)
        }
    }
}

/// HTTP surface for a presentation client: read snapshots, push samples, issue commands.
pub struct GuiBridge {
    handle: EngineHandle,
}

impl GuiBridge {
    pub fn new(handle: EngineHandle) -> Self {
        Self { handle }
    }

    pub fn routes(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
        let handle = self.handle.clone();
        let handle_filter = warp::any().map(move || handle.clone());

        let snapshot_route = warp::path!("snapshot")
            .and(warp::get())
            .and(handle_filter.clone())
            .map(|handle: EngineHandle| ok(&*handle.snapshot()));

        let history_route = warp::path!("history")
            .and(warp::get())
            .and(handle_filter.clone())
            .map(|handle: EngineHandle| ok(&handle.session_history()));

        let artwork_route = warp::path!("artworks" / u32)
            .and(warp::get())
            .and(handle_filter.clone())
            .map(|id: u32, handle: EngineHandle| match handle.artwork(id) {
                Some(artwork) => ok(&artwork),
                None => warp::reply::with_status(
                    warp::reply::json(&json!({ "status": "not_found", "id": id })),
                    StatusCode::NOT_FOUND,
                ),
            });

        let position_route = warp::path!("position")
            .and(warp::post())
            .and(warp::body::json())
            .and(handle_filter.clone())
            .and_then(ingest_position);

        let steps_route = warp::path!("steps")
            .and(warp::post())
            .and(warp::body::json())
            .and(handle_filter.clone())
            .and_then(ingest_steps);

        let sensor_route = warp::path!("sensor")
            .and(warp::post())
            .and(warp::body::json())
            .and(handle_filter.clone())
            .and_then(report_sensor);

        let start_route = warp::path!("session" / "start")
            .and(warp::post())
            .and(handle_filter.clone())
            .and_then(|handle: EngineHandle| async move {
                Ok::<_, Infallible>(respond(handle.start_session().await))
            });

        let end_route = warp::path!("session" / "end")
            .and(warp::post())
            .and(handle_filter)
            .and_then(|handle: EngineHandle| async move {
                Ok::<_, Infallible>(respond(handle.end_session().await))
            });

        snapshot_route
            .or(history_route)
            .or(artwork_route)
            .or(position_route)
            .or(steps_route)
            .or(sensor_route)
            .or(start_route)
            .or(end_route)
    }

    /// Serves the bridge until the surrounding runtime shuts down.
    pub async fn serve(self, addr: SocketAddr) {
        self.publish_status(&format!("HTTP bridge listening on {}", addr));
        warp::serve(self.routes()).run(addr).await;
    }

    pub fn publish_discovery(&self, event: &DiscoveryEvent) {
        println!(
            "[GUI] Art Discovery! {}",
            DiscoveryNotice::message(event, self.handle.step_goal())
        );
    }

    pub fn publish_status(&self, message: &str) {
        info!("{}", message);
        println!("[GUI] {}", message);
    }
}

async fn ingest_position(
    report: PositionReport,
    handle: EngineHandle,
) -> Result<JsonReply, Infallible> {
    let sample = PositionSample::new(report.latitude, report.longitude, Utc::now());
    let result = match handle.ingest_position(sample).await {
        Ok(()) => handle.flush().await,
        Err(err) => Err(err),
    };
    Ok(respond(
        result.map(|()| json!({ "status": "ok", "nearest": handle.current_nearest_artwork() })),
    ))
}

async fn ingest_steps(report: StepReport, handle: EngineHandle) -> Result<JsonReply, Infallible> {
    let sample = StepSample::new(report.steps, Utc::now());
    let result = match handle.ingest_steps(sample).await {
        Ok(()) => handle.flush().await,
        Err(err) => Err(err),
    };
    Ok(respond(
        result.map(|()| json!({ "status": "ok", "progress": handle.step_progress() })),
    ))
}

async fn report_sensor(report: SensorReport, handle: EngineHandle) -> Result<JsonReply, Infallible> {
    let result = match handle.set_step_sensor_available(report.available).await {
        Ok(()) => handle.flush().await,
        Err(err) => Err(err),
    };
    Ok(respond(result.map(|()| json!({ "status": "ok" }))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use artwalkcore::catalog::{Artwork, Catalog, Coordinates};
    use artwalkcore::prelude::EngineConfig;
    use artwalkcore::processing::StreamMerger;

    fn bridge() -> GuiBridge {
        let artwork = Artwork {
            id: 1,
            name: "Keeper of the Plains".into(),
            artist: "Blackbear Bosin".into(),
            description: String::new(),
            image: None,
            coords: Coordinates::new(37.6922, -97.3456),
            trigger_distance: 0.0095,
            art_type: None,
            year: None,
        };
        let (handle, _task) =
            StreamMerger::spawn(Catalog::new(vec![artwork]).unwrap(), EngineConfig::default());
        GuiBridge::new(handle)
    }

    #[tokio::test]
    async fn posted_position_updates_snapshot() {
        let gui = bridge();
        let routes = gui.routes();

        let response = warp::test::request()
            .method("POST")
            .path("/position")
            .json(&PositionReport {
                latitude: 37.6922,
                longitude: -97.3456,
            })
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = warp::test::request()
            .method("GET")
            .path("/snapshot")
            .reply(&routes)
            .await;
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["nearest"]["artwork"]["id"], 1);
        assert_eq!(body["discovered"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ending_idle_session_is_a_conflict() {
        let gui = bridge();
        let response = warp::test::request()
            .method("POST")
            .path("/session/end")
            .reply(&gui.routes())
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn start_without_sensor_is_unavailable() {
        let gui = bridge();
        let routes = gui.routes();
        warp::test::request()
            .method("POST")
            .path("/sensor")
            .json(&SensorReport { available: false })
            .reply(&routes)
            .await;

        let response = warp::test::request()
            .method("POST")
            .path("/session/start")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn unknown_artwork_is_not_found() {
        let gui = bridge();
        let response = warp::test::request()
            .method("GET")
            .path("/artworks/99")
            .reply(&gui.routes())
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
