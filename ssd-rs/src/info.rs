//! Channel metadata and channel-subset ("picks") resolution.

use crate::error::{Error, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Kind of sensor a channel records from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    /// Scalp electroencephalography.
    Eeg,
    /// Magnetometer.
    Mag,
    /// Planar gradiometer.
    Grad,
    /// Stereo EEG depth electrode.
    Seeg,
    /// Electrocorticography.
    Ecog,
    /// Electrooculography.
    Eog,
    /// Electrocardiography.
    Ecg,
    /// Trigger/stimulus channel.
    Stim,
    /// Anything else.
    Misc,
}

impl ChannelType {
    /// Whether the channel carries brain data (as opposed to auxiliary or trigger signals).
    pub fn is_data(self) -> bool {
        matches!(
            self,
            ChannelType::Eeg
                | ChannelType::Mag
                | ChannelType::Grad
                | ChannelType::Seeg
                | ChannelType::Ecog
        )
    }
}

/// Measurement info: channel names, types, bad channels and sampling rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    ch_names: Vec<String>,
    ch_types: Vec<ChannelType>,
    bads: Vec<String>,
    sfreq: f64,
}

impl Info {
    /// Build info for explicitly named and typed channels.
    pub fn new(ch_names: Vec<String>, ch_types: Vec<ChannelType>, sfreq: f64) -> Result<Self> {
        if ch_names.len() != ch_types.len() {
            return Err(Error::InvalidArg {
                arg: "ch_types".into(),
                reason: format!(
                    "got {} channel types for {} channel names",
                    ch_types.len(),
                    ch_names.len()
                ),
            });
        }
        if !sfreq.is_finite() || sfreq <= 0.0 {
            return Err(Error::InvalidArg {
                arg: "sfreq".into(),
                reason: format!("sampling rate must be finite and > 0, got {sfreq}"),
            });
        }
        if let Some(dup) = ch_names.iter().duplicates().next() {
            return Err(Error::InvalidArg {
                arg: "ch_names".into(),
                reason: format!("channel name `{dup}` is not unique"),
            });
        }
        Ok(Self {
            ch_names,
            ch_types,
            bads: Vec::new(),
            sfreq,
        })
    }

    /// Build info for `n_channels` channels of one type, named `"0"`, `"1"`, ...
    pub fn with_uniform_type(n_channels: usize, sfreq: f64, ch_type: ChannelType) -> Result<Self> {
        let names = (0..n_channels).map(|i| i.to_string()).collect();
        Self::new(names, vec![ch_type; n_channels], sfreq)
    }

    /// Mark channels as bad; they are skipped by [`Picks::Data`] and [`Picks::Types`].
    pub fn with_bads(mut self, bads: Vec<String>) -> Result<Self> {
        if let Some(unknown) = bads.iter().find(|b| !self.ch_names.contains(b)) {
            return Err(Error::InvalidArg {
                arg: "bads".into(),
                reason: format!("bad channel `{unknown}` is not in the channel list"),
            });
        }
        self.bads = bads;
        Ok(self)
    }

    /// Number of channels.
    pub fn n_channels(&self) -> usize {
        self.ch_names.len()
    }

    /// Sampling rate in Hz.
    pub fn sfreq(&self) -> f64 {
        self.sfreq
    }

    /// Channel names in order.
    pub fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    /// Channel types in order.
    pub fn ch_types(&self) -> &[ChannelType] {
        &self.ch_types
    }

    fn is_bad(&self, idx: usize) -> bool {
        self.bads.contains(&self.ch_names[idx])
    }

    /// Resolve a channel-subset specification into unique channel indices.
    ///
    /// Name and index picks keep the order they were given in; type picks follow channel order.
    pub fn pick_indices(&self, picks: &Picks) -> Result<Vec<usize>> {
        let idx: Vec<usize> = match picks {
            Picks::Data => (0..self.n_channels())
                .filter(|&i| self.ch_types[i].is_data() && !self.is_bad(i))
                .collect(),
            Picks::Types(types) => (0..self.n_channels())
                .filter(|&i| types.contains(&self.ch_types[i]) && !self.is_bad(i))
                .collect(),
            Picks::Names(names) => names
                .iter()
                .map(|name| {
                    self.ch_names
                        .iter()
                        .position(|n| n == name)
                        .ok_or_else(|| Error::InvalidArg {
                            arg: "picks".into(),
                            reason: format!("channel `{name}` could not be found"),
                        })
                })
                .collect::<Result<_>>()?,
            Picks::Indices(indices) => {
                if let Some(&out) = indices.iter().find(|&&i| i >= self.n_channels()) {
                    return Err(Error::InvalidArg {
                        arg: "picks".into(),
                        reason: format!(
                            "index {out} is out of range for {} channels",
                            self.n_channels()
                        ),
                    });
                }
                indices.clone()
            }
        };
        finish_picks(idx)
    }

    /// Distinct channel types among `picks`.
    pub fn channel_types(&self, picks: &[usize]) -> Vec<ChannelType> {
        picks
            .iter()
            .map(|&i| self.ch_types[i])
            .unique()
            .sorted()
            .collect()
    }
}

fn finish_picks(idx: Vec<usize>) -> Result<Vec<usize>> {
    if let Some(dup) = idx.iter().duplicates().next() {
        return Err(Error::InvalidArg {
            arg: "picks".into(),
            reason: format!("channel index {dup} is picked more than once"),
        });
    }
    if idx.is_empty() {
        return Err(Error::InvalidArg {
            arg: "picks".into(),
            reason: "no channels were selected".into(),
        });
    }
    Ok(idx)
}

/// Channel-subset specification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum Picks {
    /// Every good data channel.
    #[default]
    Data,
    /// Every good channel of the listed types.
    Types(Vec<ChannelType>),
    /// Channels by name, in the given order.
    Names(Vec<String>),
    /// Channels by index, in the given order.
    Indices(Vec<usize>),
}

/// Where an SSD model gets its sampling rate and channel layout from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SsdInfo {
    /// Full measurement info; channel count and types are checked against the data.
    Info(Info),
    /// Sampling rate only; channels are untyped, so only data, name and index picks apply.
    Sfreq(f64),
}

impl SsdInfo {
    /// Sampling rate in Hz.
    pub fn sfreq(&self) -> f64 {
        match self {
            SsdInfo::Info(info) => info.sfreq(),
            SsdInfo::Sfreq(sfreq) => *sfreq,
        }
    }
}

impl From<Info> for SsdInfo {
    fn from(info: Info) -> Self {
        SsdInfo::Info(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_info() -> Info {
        let names = ["Fz", "Cz", "Pz", "EOG1", "STI"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let types = vec![
            ChannelType::Eeg,
            ChannelType::Eeg,
            ChannelType::Eeg,
            ChannelType::Eog,
            ChannelType::Stim,
        ];
        Info::new(names, types, 250.0).expect("valid info")
    }

    #[test]
    fn data_picks_skip_auxiliary_and_bad_channels() {
        let info = mixed_info().with_bads(vec!["Cz".into()]).expect("known bad");
        assert_eq!(info.pick_indices(&Picks::Data).expect("picks"), vec![0, 2]);
    }

    #[test]
    fn name_and_index_picks_keep_the_requested_order() {
        let info = mixed_info();
        let picks = Picks::Names(vec!["Pz".into(), "Fz".into()]);
        assert_eq!(info.pick_indices(&picks).expect("picks"), vec![2, 0]);
        let picks = Picks::Indices(vec![3, 1, 0]);
        assert_eq!(info.pick_indices(&picks).expect("picks"), vec![3, 1, 0]);
    }

    #[test]
    fn invalid_picks_are_rejected() {
        let info = mixed_info();
        assert!(info.pick_indices(&Picks::Indices(vec![1, 1])).is_err());
        assert!(info.pick_indices(&Picks::Indices(vec![9])).is_err());
        assert!(info.pick_indices(&Picks::Names(vec!["Oz".into()])).is_err());
        assert!(info
            .pick_indices(&Picks::Types(vec![ChannelType::Mag]))
            .is_err());
    }

    #[test]
    fn channel_types_are_deduplicated() {
        let info = mixed_info();
        assert_eq!(
            info.channel_types(&[0, 1, 3]),
            vec![ChannelType::Eeg, ChannelType::Eog]
        );
    }

    #[test]
    fn info_validates_lengths_and_rate() {
        assert!(Info::new(vec!["a".into()], vec![], 100.0).is_err());
        assert!(Info::with_uniform_type(2, 0.0, ChannelType::Eeg).is_err());
        assert_eq!(
            Info::with_uniform_type(4, 100.0, ChannelType::Eeg)
                .expect("valid")
                .n_channels(),
            4
        );
    }
}
