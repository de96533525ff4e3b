//! Raster tiles fetched on a worker thread and cached as textures.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};

use anyhow::Context;
use eframe::egui;

pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Upper bound on cached textures before the cache is cleared.
const MAX_TILES: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub z: u32,
    pub x: u32,
    pub y: u32,
}

impl TileKey {
    /// Substitute `{z}`, `{x}`, `{y}` and `{s}` in a URL pattern.
    pub fn url(&self, pattern: &str) -> String {
        const SUBDOMAINS: [&str; 3] = ["a", "b", "c"];
        let sub = SUBDOMAINS[((self.x + self.y) % 3) as usize];
        pattern
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
            .replace("{s}", sub)
    }
}

enum Slot {
    Pending,
    Ready(egui::TextureHandle),
    Failed,
}

type TileResult = (TileKey, anyhow::Result<egui::ColorImage>);

struct Worker {
    requests: Sender<TileKey>,
    results: Receiver<TileResult>,
}

pub struct TileCache {
    url_pattern: String,
    slots: HashMap<TileKey, Slot>,
    worker: Option<Worker>,
}

impl TileCache {
    /// An empty pattern disables tiles; the map draws on a plain background.
    pub fn new(url_pattern: impl Into<String>) -> Self {
        Self {
            url_pattern: url_pattern.into(),
            slots: HashMap::new(),
            worker: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.url_pattern.trim().is_empty()
    }

    /// Texture for `key` if it has arrived; queues a download otherwise.
    pub fn get(&mut self, ctx: &egui::Context, key: TileKey) -> Option<&egui::TextureHandle> {
        if !self.is_enabled() {
            return None;
        }
        if !self.slots.contains_key(&key) {
            if self.slots.len() >= MAX_TILES {
                self.slots.retain(|_, slot| matches!(slot, Slot::Pending));
            }
            if self.request(ctx, key) {
                self.slots.insert(key, Slot::Pending);
            } else {
                self.slots.insert(key, Slot::Failed);
            }
        }
        match self.slots.get(&key) {
            Some(Slot::Ready(texture)) => Some(texture),
            _ => None,
        }
    }

    /// Move finished downloads into textures.
    pub fn poll(&mut self, ctx: &egui::Context) {
        let Some(worker) = &self.worker else {
            return;
        };
        let finished: Vec<TileResult> = worker.results.try_iter().collect();
        for (key, result) in finished {
            let slot = match result {
                Ok(image) => {
                    crate::trace!("tiles"; "tile {}/{}/{} ready", key.z, key.x, key.y);
                    let name = format!("tile-{}-{}-{}", key.z, key.x, key.y);
                    Slot::Ready(ctx.load_texture(name, image, egui::TextureOptions::LINEAR))
                }
                Err(e) => {
                    crate::debug!("tiles"; "tile {}/{}/{} unavailable: {e:#}", key.z, key.x, key.y);
                    Slot::Failed
                }
            };
            self.slots.insert(key, slot);
        }
    }

    fn request(&mut self, ctx: &egui::Context, key: TileKey) -> bool {
        if self.worker.is_none() {
            match spawn_worker(self.url_pattern.clone(), ctx.clone()) {
                Ok(worker) => self.worker = Some(worker),
                Err(e) => {
                    crate::error!("tiles"; "{e:#}");
                    self.url_pattern.clear();
                    return false;
                }
            }
        }
        self.worker
            .as_ref()
            .is_some_and(|w| w.requests.send(key).is_ok())
    }
}

fn spawn_worker(pattern: String, ctx: egui::Context) -> anyhow::Result<Worker> {
    let (req_tx, req_rx) = mpsc::channel::<TileKey>();
    let (res_tx, res_rx) = mpsc::channel::<TileResult>();
    let user_agent = format!("slidemap/{}", env!("CARGO_PKG_VERSION"));

    std::thread::Builder::new()
        .name("tile-fetcher".to_string())
        .spawn(move || {
            for key in req_rx {
                let result = fetch_tile(&key.url(&pattern), &user_agent);
                if res_tx.send((key, result)).is_err() {
                    break;
                }
                ctx.request_repaint();
            }
        })
        .context("Failed to start the tile fetcher thread")?;

    Ok(Worker {
        requests: req_tx,
        results: res_rx,
    })
}

fn fetch_tile(url: &str, user_agent: &str) -> anyhow::Result<egui::ColorImage> {
    let bytes = ureq::get(url)
        .header("User-Agent", user_agent)
        .call()
        .with_context(|| format!("GET {url}"))?
        .body_mut()
        .read_to_vec()
        .context("Failed to read tile body")?;
    decode_tile(&bytes)
}

fn decode_tile(bytes: &[u8]) -> anyhow::Result<egui::ColorImage> {
    let image = image::load_from_memory(bytes)
        .context("Failed to decode tile image")?
        .into_rgba8();
    let (w, h) = image.dimensions();
    Ok(egui::ColorImage::from_rgba_unmultiplied(
        [w as usize, h as usize],
        image.as_raw(),
    ))
}
