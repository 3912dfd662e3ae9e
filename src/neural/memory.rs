//! Spike memory: the append-only log of input events a neuron has received.

use super::neuron::NeuronId;
use serde::{Deserialize, Serialize};

/// Discrete simulation time, one unit per frame
pub type Frame = u64;

/// Polarity of a spike or of a learning target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    #[inline]
    pub fn from_bool(is_positive: bool) -> Self {
        if is_positive {
            Sign::Positive
        } else {
            Sign::Negative
        }
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        matches!(self, Sign::Positive)
    }

    /// +1.0 or -1.0
    #[inline]
    pub fn value(self) -> f64 {
        match self {
            Sign::Positive => 1.0,
            Sign::Negative => -1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Sign::Positive => Sign::Negative,
            Sign::Negative => Sign::Positive,
        }
    }
}

/// Where a remembered spike came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpikeSource {
    /// Externally injected, unweighted amplitude
    Sensory { amplitude: f64 },
    /// Spike delivered by an input neuron; weighted by the receiver
    Neuron(NeuronId),
}

/// A single remembered input event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpikeEvent {
    pub time: Frame,
    pub source: SpikeSource,
    pub sign: Sign,
}

impl SpikeEvent {
    pub fn sensory(time: Frame, amplitude: f64, sign: Sign) -> Self {
        Self {
            time,
            source: SpikeSource::Sensory { amplitude },
            sign,
        }
    }

    pub fn from_neuron(time: Frame, source: NeuronId, sign: Sign) -> Self {
        Self {
            time,
            source: SpikeSource::Neuron(source),
            sign,
        }
    }

    /// Source neuron, or `None` for sensory events
    #[inline]
    pub fn neuron(&self) -> Option<NeuronId> {
        match self.source {
            SpikeSource::Neuron(id) => Some(id),
            SpikeSource::Sensory { .. } => None,
        }
    }

    #[inline]
    pub fn is_sensory(&self) -> bool {
        matches!(self.source, SpikeSource::Sensory { .. })
    }
}

/// Append-only event log owned by a single neuron.
///
/// Events are never removed individually; the whole log is cleared when the
/// neuron fires or a run starts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpikeMemory {
    events: Vec<SpikeEvent>,
}

impl SpikeMemory {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, event: SpikeEvent) {
        self.events.push(event);
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpikeEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Neuron-sourced events with `now - time < cutoff`.
    ///
    /// Sensory events are skipped: they cannot be credited by learning.
    pub fn recent_neuron_events(
        &self,
        now: Frame,
        cutoff: f64,
    ) -> impl Iterator<Item = (NeuronId, Sign)> + '_ {
        self.events.iter().filter_map(move |e| {
            let source = e.neuron()?;
            let dt = now as f64 - e.time as f64;
            (dt < cutoff).then_some((source, e.sign))
        })
    }
}
