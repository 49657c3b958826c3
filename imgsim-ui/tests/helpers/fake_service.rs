//! Scriptable in-process SimilarityService
//!
//! Search and index calls park until the test answers them, in any order,
//! unless an automatic reply is configured. Stats, health and delete answer
//! immediately with whatever was last scripted.

use std::sync::Mutex;

use async_trait::async_trait;
use imgsim_common::api::{
    HealthSnapshot, IndexRequest, IndexResponse, SearchRequest, SearchResponse, StatsSnapshot,
};
use imgsim_ui::client::{ClientError, SimilarityService};
use tokio::sync::{oneshot, watch};

type Reply<T> = Result<T, ClientError>;

/// Calls of one kind, each parked until answered
struct Parked<Req, Resp> {
    requests: Mutex<Vec<Req>>,
    senders: Mutex<Vec<Option<oneshot::Sender<Reply<Resp>>>>>,
    auto_reply: Mutex<Option<Reply<Resp>>>,
    count: watch::Sender<usize>,
}

impl<Req: Clone, Resp: Clone> Parked<Req, Resp> {
    fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            senders: Mutex::new(Vec::new()),
            auto_reply: Mutex::new(None),
            count: watch::channel(0).0,
        }
    }

    async fn call(&self, request: &Req) -> Reply<Resp> {
        let auto = self.auto_reply.lock().unwrap().clone();
        self.requests.lock().unwrap().push(request.clone());

        if let Some(reply) = auto {
            self.count.send_modify(|c| *c += 1);
            return reply;
        }

        let (tx, rx) = oneshot::channel();
        self.senders.lock().unwrap().push(Some(tx));
        self.count.send_modify(|c| *c += 1);

        rx.await
            .unwrap_or_else(|_| Err(ClientError::Transport("fake reply dropped".into())))
    }

    fn respond(&self, call: usize, reply: Reply<Resp>) {
        let sender = self.senders.lock().unwrap()[call]
            .take()
            .expect("call already answered");
        let _ = sender.send(reply);
    }

    async fn wait_for(&self, calls: usize) {
        let mut rx = self.count.subscribe();
        rx.wait_for(|c| *c >= calls).await.expect("fake service dropped");
    }
}

/// Fake remote service
pub struct FakeService {
    searches: Parked<SearchRequest, SearchResponse>,
    indexes: Parked<IndexRequest, IndexResponse>,
    stats: Mutex<Reply<StatsSnapshot>>,
    health: Mutex<Reply<HealthSnapshot>>,
    delete_reply: Mutex<Reply<()>>,
    deleted: Mutex<Vec<String>>,
}

impl Default for FakeService {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeService {
    pub fn new() -> Self {
        Self {
            searches: Parked::new(),
            indexes: Parked::new(),
            stats: Mutex::new(Err(ClientError::Transport("stats not scripted".into()))),
            health: Mutex::new(Err(ClientError::Transport("health not scripted".into()))),
            delete_reply: Mutex::new(Ok(())),
            deleted: Mutex::new(Vec::new()),
        }
    }

    // ---- search ----

    /// Answer every future search immediately
    pub fn auto_search(&self, reply: Reply<SearchResponse>) {
        *self.searches.auto_reply.lock().unwrap() = Some(reply);
    }

    /// Wait until `calls` searches have reached the service
    pub async fn wait_for_searches(&self, calls: usize) {
        self.searches.wait_for(calls).await;
    }

    /// Answer the parked search number `call` (0-based)
    pub fn respond_search(&self, call: usize, reply: Reply<SearchResponse>) {
        self.searches.respond(call, reply);
    }

    pub fn search_requests(&self) -> Vec<SearchRequest> {
        self.searches.requests.lock().unwrap().clone()
    }

    // ---- index ----

    pub fn auto_index(&self, reply: Reply<IndexResponse>) {
        *self.indexes.auto_reply.lock().unwrap() = Some(reply);
    }

    pub async fn wait_for_indexes(&self, calls: usize) {
        self.indexes.wait_for(calls).await;
    }

    pub fn respond_index(&self, call: usize, reply: Reply<IndexResponse>) {
        self.indexes.respond(call, reply);
    }

    pub fn index_requests(&self) -> Vec<IndexRequest> {
        self.indexes.requests.lock().unwrap().clone()
    }

    // ---- stats / health / delete ----

    pub fn set_stats(&self, reply: Reply<StatsSnapshot>) {
        *self.stats.lock().unwrap() = reply;
    }

    pub fn set_health(&self, reply: Reply<HealthSnapshot>) {
        *self.health.lock().unwrap() = reply;
    }

    pub fn set_delete(&self, reply: Reply<()>) {
        *self.delete_reply.lock().unwrap() = reply;
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimilarityService for FakeService {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, ClientError> {
        self.searches.call(request).await
    }

    async fn index(&self, request: &IndexRequest) -> Result<IndexResponse, ClientError> {
        self.indexes.call(request).await
    }

    async fn delete_image(&self, image_id: &str) -> Result<(), ClientError> {
        self.deleted.lock().unwrap().push(image_id.to_string());
        self.delete_reply.lock().unwrap().clone()
    }

    async fn get_stats(&self) -> Result<StatsSnapshot, ClientError> {
        self.stats.lock().unwrap().clone()
    }

    async fn get_health(&self) -> Result<HealthSnapshot, ClientError> {
        self.health.lock().unwrap().clone()
    }
}
