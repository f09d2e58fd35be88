/// In-memory store of decoded sound assets
///
/// Assets are decoded fully at load time, downmixed to mono and converted to
/// the engine rate, then shared read-only through `Arc`. The bank publishes
/// its occupancy through an atomic counter the source selector reads each
/// tick.
use crate::decoder::SymphoniaDecoder;
use crate::resample::resample_mono;
use booster_core::{AssetId, AssetPlayer, AudioDecoder, BoosterError, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A decoded asset at the engine sample rate
#[derive(Debug)]
pub struct DecodedAsset {
    id: AssetId,
    samples: Vec<f32>,
    sample_rate: u32,
}

impl DecodedAsset {
    pub fn new(id: AssetId, samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            id,
            samples,
            sample_rate,
        }
    }

    pub fn id(&self) -> &AssetId {
        &self.id
    }

    /// Mono samples in [-1.0, 1.0]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Loaded assets keyed by source path
pub struct SampleBank {
    assets: HashMap<AssetId, Arc<DecodedAsset>>,
    sample_rate: u32,
    occupancy: Arc<AtomicUsize>,
    decoder: Box<dyn AudioDecoder>,
}

impl SampleBank {
    /// Bank decoding with Symphonia, converting assets to `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        Self::with_decoder(sample_rate, Box::new(SymphoniaDecoder::new()))
    }

    pub fn with_decoder(sample_rate: u32, decoder: Box<dyn AudioDecoder>) -> Self {
        Self {
            assets: HashMap::new(),
            sample_rate,
            occupancy: Arc::new(AtomicUsize::new(0)),
            decoder,
        }
    }

    /// Counter mirroring `len()`, shared with the source selector
    pub fn occupancy(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.occupancy)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Convert every loaded asset to `sample_rate`
    ///
    /// Used when the device negotiates a rate other than the configured one.
    /// Occupancy is unchanged.
    pub fn set_sample_rate(&mut self, sample_rate: u32) -> Result<()> {
        if sample_rate == self.sample_rate {
            return Ok(());
        }

        for asset in self.assets.values_mut() {
            let samples = resample_mono(asset.samples(), asset.sample_rate(), sample_rate)
                .map_err(BoosterError::from)?;
            *asset = Arc::new(DecodedAsset::new(asset.id().clone(), samples, sample_rate));
        }

        tracing::debug!(
            "Sample bank converted {} -> {} Hz",
            self.sample_rate,
            sample_rate
        );
        self.sample_rate = sample_rate;
        Ok(())
    }

    /// Decode `path` fully into memory
    ///
    /// Reloading a path replaces the previous entry.
    ///
    /// # Errors
    /// `NotFound` if the path is missing, unreadable or not decodable audio
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<AssetId> {
        let path = path.as_ref();
        let id = AssetId::from_path(path);

        if !path.is_file() {
            tracing::warn!("Sound not found: {}", path.display());
            return Err(BoosterError::not_found(id.as_str()));
        }

        let buffer = self.decoder.decode(path).map_err(|e| match e {
            BoosterError::NotFound(_) => e,
            other => BoosterError::not_found(format!("{}: {}", path.display(), other)),
        })?;

        let source_rate = buffer.format.sample_rate.as_hz();
        let mono = buffer.into_mono();
        let samples = resample_mono(&mono.samples, source_rate, self.sample_rate)
            .map_err(|e| BoosterError::not_found(format!("{}: {}", path.display(), e)))?;

        let asset = DecodedAsset::new(id.clone(), samples, self.sample_rate);
        tracing::info!(
            "Loaded sound {} ({:.2}s, {} Hz source)",
            id,
            asset.duration_secs(),
            source_rate
        );

        self.insert(Arc::new(asset));
        Ok(id)
    }

    /// Add an already-decoded asset
    pub fn insert(&mut self, asset: Arc<DecodedAsset>) -> AssetId {
        let id = asset.id().clone();
        self.assets.insert(id.clone(), asset);
        self.occupancy.store(self.assets.len(), Ordering::Release);
        id
    }

    /// Remove an asset, returning it if it was loaded
    pub fn unload(&mut self, id: &AssetId) -> Option<Arc<DecodedAsset>> {
        let removed = self.assets.remove(id);
        self.occupancy.store(self.assets.len(), Ordering::Release);
        if removed.is_some() {
            tracing::info!("Unloaded sound {}", id);
        }
        removed
    }

    pub fn get(&self, id: &AssetId) -> Option<Arc<DecodedAsset>> {
        self.assets.get(id).cloned()
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.assets.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Loaded ids, sorted
    pub fn ids(&self) -> Vec<AssetId> {
        let mut ids: Vec<_> = self.assets.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Play an asset to completion through `player`
    ///
    /// # Errors
    /// `UnknownAsset` if `id` was never loaded, otherwise whatever the player
    /// reports
    pub fn play(&self, id: &AssetId, player: &dyn AssetPlayer) -> Result<()> {
        let asset = self
            .assets
            .get(id)
            .ok_or_else(|| BoosterError::UnknownAsset(id.clone()))?;

        tracing::debug!("Playing sound {}", id);
        player.play_blocking(asset.samples(), asset.sample_rate())
    }
}
