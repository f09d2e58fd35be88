/// Per-tick choice between live microphone and injected sample audio
///
/// While the Sample Bank holds at least one asset the pipeline runs in
/// sample-injection mode: the microphone is ignored and the frame is filled
/// from the cued asset (played once, then silence). With an empty bank the
/// live input passes through.
///
/// Cues travel from the control thread over a bounded channel and are
/// picked up at the start of a tick. Replaced assets are handed back over a
/// second channel so the audio thread never drops the last reference.
use crate::sample_bank::DecodedAsset;
use booster_core::AssetId;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const CUE_CAPACITY: usize = 8;
const RETIRED_CAPACITY: usize = 32;

/// Source chosen for the current tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalSource<'a> {
    /// Microphone block passes through
    LiveInput,
    /// Frame comes from the cued asset, or silence if nothing is cued
    InjectedSample(Option<&'a AssetId>),
}

impl SignalSource<'_> {
    pub fn is_live(&self) -> bool {
        matches!(self, Self::LiveInput)
    }
}

enum CueCommand {
    Cue(Arc<DecodedAsset>),
    Clear,
}

/// Control-thread end of the selector
pub struct CueSender {
    cue_tx: Sender<CueCommand>,
    retired_rx: Receiver<Arc<DecodedAsset>>,
}

impl CueSender {
    /// Queue `asset` to play from its start on the next tick
    ///
    /// Returns false if the audio thread has fallen behind on cues.
    pub fn cue(&self, asset: Arc<DecodedAsset>) -> bool {
        self.collect_retired();
        match self.cue_tx.try_send(CueCommand::Cue(asset)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Cue queue full, dropping cue");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Stop any injected playback (frames become silent)
    pub fn clear(&self) -> bool {
        self.collect_retired();
        self.cue_tx.try_send(CueCommand::Clear).is_ok()
    }

    /// Free assets the audio thread has released
    pub fn collect_retired(&self) -> usize {
        self.retired_rx.try_iter().count()
    }
}

/// Audio-thread end of the selector
pub struct SourceSelector {
    occupancy: Arc<AtomicUsize>,
    cue_rx: Receiver<CueCommand>,
    retired_tx: Sender<Arc<DecodedAsset>>,
    cued: Option<Arc<DecodedAsset>>,
    cursor: usize,
    injecting: bool,
}

/// Create a connected selector pair reading bank occupancy from `occupancy`
pub fn source_channel(occupancy: Arc<AtomicUsize>) -> (CueSender, SourceSelector) {
    let (cue_tx, cue_rx) = bounded(CUE_CAPACITY);
    let (retired_tx, retired_rx) = bounded(RETIRED_CAPACITY);

    (
        CueSender { cue_tx, retired_rx },
        SourceSelector {
            occupancy,
            cue_rx,
            retired_tx,
            cued: None,
            cursor: 0,
            injecting: false,
        },
    )
}

impl SourceSelector {
    /// Apply pending cues and pick this tick's source
    pub fn select(&mut self) -> SignalSource<'_> {
        while let Ok(command) = self.cue_rx.try_recv() {
            match command {
                CueCommand::Cue(asset) => {
                    self.retire_current();
                    self.cued = Some(asset);
                    self.cursor = 0;
                }
                CueCommand::Clear => self.retire_current(),
            }
        }

        self.injecting = self.occupancy.load(Ordering::Acquire) > 0;
        if !self.injecting {
            self.retire_current();
        }

        self.source()
    }

    /// Source picked by the last `select`
    pub fn source(&self) -> SignalSource<'_> {
        if self.injecting {
            SignalSource::InjectedSample(self.cued.as_ref().map(|a| a.id()))
        } else {
            SignalSource::LiveInput
        }
    }

    /// Fill `frame` from the selected source
    ///
    /// A short `input` block is padded with silence.
    pub fn fill(&mut self, input: &[f32], frame: &mut [f32]) {
        if !self.injecting {
            let n = input.len().min(frame.len());
            frame[..n].copy_from_slice(&input[..n]);
            frame[n..].fill(0.0);
            return;
        }

        let Some(asset) = self.cued.as_ref() else {
            frame.fill(0.0);
            return;
        };

        let samples = asset.samples();
        let start = self.cursor.min(samples.len());
        let n = (samples.len() - start).min(frame.len());
        frame[..n].copy_from_slice(&samples[start..start + n]);
        frame[n..].fill(0.0);
        self.cursor = start + n;
    }

    /// Remaining samples of the cued asset
    pub fn remaining(&self) -> usize {
        self.cued
            .as_ref()
            .map(|a| a.len().saturating_sub(self.cursor))
            .unwrap_or(0)
    }

    fn retire_current(&mut self) {
        if let Some(asset) = self.cued.take() {
            // If the control side stopped collecting, the asset is dropped here
            let _ = self.retired_tx.try_send(asset);
        }
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str, samples: Vec<f32>) -> Arc<DecodedAsset> {
        Arc::new(DecodedAsset::new(AssetId::new(name), samples, 44_100))
    }

    #[test]
    fn empty_bank_selects_live_input() {
        let occupancy = Arc::new(AtomicUsize::new(0));
        let (_tx, mut selector) = source_channel(occupancy);

        assert_eq!(selector.select(), SignalSource::LiveInput);

        let mut frame = [9.0; 4];
        selector.fill(&[0.1, 0.2, 0.3], &mut frame);
        assert_eq!(frame, [0.1, 0.2, 0.3, 0.0]);
    }

    #[test]
    fn loaded_bank_without_cue_is_silent() {
        let occupancy = Arc::new(AtomicUsize::new(1));
        let (_tx, mut selector) = source_channel(occupancy);

        assert_eq!(selector.select(), SignalSource::InjectedSample(None));

        let mut frame = [9.0; 3];
        selector.fill(&[0.5, 0.5, 0.5], &mut frame);
        assert_eq!(frame, [0.0; 3]);
    }

    #[test]
    fn cued_asset_replaces_mic_and_plays_once() {
        let occupancy = Arc::new(AtomicUsize::new(1));
        let (tx, mut selector) = source_channel(occupancy);
        assert!(tx.cue(asset("horn.wav", vec![0.1, 0.2, 0.3, 0.4, 0.5])));

        let id = AssetId::new("horn.wav");
        assert_eq!(selector.select(), SignalSource::InjectedSample(Some(&id)));

        let mic = [0.9; 3];
        let mut frame = [0.0; 3];
        selector.fill(&mic, &mut frame);
        assert_eq!(frame, [0.1, 0.2, 0.3]);

        selector.fill(&mic, &mut frame);
        assert_eq!(frame, [0.4, 0.5, 0.0]);

        selector.fill(&mic, &mut frame);
        assert_eq!(frame, [0.0; 3]);
        assert_eq!(selector.remaining(), 0);
    }

    #[test]
    fn recue_restarts_and_retires_previous() {
        let occupancy = Arc::new(AtomicUsize::new(1));
        let (tx, mut selector) = source_channel(occupancy);
        let first = asset("a.wav", vec![0.1; 4]);
        tx.cue(Arc::clone(&first));
        selector.select();
        let mut frame = [0.0; 2];
        selector.fill(&[], &mut frame);

        tx.cue(asset("b.wav", vec![0.2; 4]));
        selector.select();
        selector.fill(&[], &mut frame);

        assert_eq!(frame, [0.2, 0.2]);
        assert_eq!(tx.collect_retired(), 1);
        assert_eq!(Arc::strong_count(&first), 1);
    }

    #[test]
    fn emptying_bank_returns_to_live_input() {
        let occupancy = Arc::new(AtomicUsize::new(1));
        let (tx, mut selector) = source_channel(Arc::clone(&occupancy));
        tx.cue(asset("a.wav", vec![0.1; 4]));
        assert!(!selector.select().is_live());

        occupancy.store(0, Ordering::Release);

        assert!(selector.select().is_live());
        assert_eq!(selector.remaining(), 0);
        assert_eq!(tx.collect_retired(), 1);
    }

    #[test]
    fn clear_silences_injection() {
        let occupancy = Arc::new(AtomicUsize::new(1));
        let (tx, mut selector) = source_channel(occupancy);
        tx.cue(asset("a.wav", vec![0.3; 8]));
        selector.select();

        tx.clear();

        assert_eq!(selector.select(), SignalSource::InjectedSample(None));
    }
}
