//! Model loading and forward inference
//!
//! The classifier is a character-level ConvLSTM: embedding, one Conv1d layer,
//! a stack of LSTM layers, and a linear head with log-softmax output. Weights
//! are fetched from the artifact store as safetensors and loaded onto the
//! selected device; missing or unreadable artifacts are fatal for the request.

use crate::artifacts::{ArtifactStore, ModelHyperparams};
use crate::error::{EngineError, Result};
use crate::text::{EncodedBatch, ALPHABET};
use candle_core::{DType, Device, Tensor, D};
use candle_nn::{
    conv1d, embedding, linear, lstm, ops, Conv1d, Conv1dConfig, Embedding, LSTMConfig, Linear,
    Module, VarBuilder, LSTM, RNN,
};
use tracing::debug;

/// Embedding vocabulary: the 28-symbol alphabet plus the padding index 0.
const VOCAB_SIZE: usize = ALPHABET.len() + 1;

/// Selects the inference device for a configured preference.
///
/// "auto" picks the accelerator when one is available and falls back to CPU;
/// callers never branch on hardware beyond this.
pub fn select_device(preference: &str) -> Result<Device> {
    match preference {
        "cpu" => Ok(Device::Cpu),
        "cuda" => Device::new_cuda(0).map_err(EngineError::from),
        "auto" => Ok(Device::cuda_if_available(0).unwrap_or(Device::Cpu)),
        other => Err(EngineError::config(format!(
            "unknown device preference '{}'",
            other
        ))),
    }
}

/// Character-level ConvLSTM nationality classifier
#[derive(Debug)]
pub struct ConvLstm {
    embed: Embedding,
    conv: Conv1d,
    rnn_layers: Vec<LSTM>,
    out: Linear,
}

impl ConvLstm {
    /// Build the network shaped by the stored hyperparameters.
    ///
    /// `class_amount` comes from the resolved class list, not the artifact
    /// config, so the output head always matches the serving class order.
    pub fn new(class_amount: usize, params: &ModelHyperparams, vb: VarBuilder) -> Result<Self> {
        let kernel_size = params.kernel_size()?;
        let channels = params.channels()?;

        let embed = embedding(VOCAB_SIZE, params.embedding_size, vb.pp("embed"))?;
        let conv = conv1d(
            params.embedding_size,
            channels,
            kernel_size,
            Conv1dConfig {
                padding: kernel_size / 2,
                ..Default::default()
            },
            vb.pp("conv"),
        )?;

        let mut rnn_layers = Vec::with_capacity(params.rnn_layers);
        for layer_idx in 0..params.rnn_layers {
            let in_dim = if layer_idx == 0 {
                channels
            } else {
                params.hidden_size
            };
            rnn_layers.push(lstm(
                in_dim,
                params.hidden_size,
                LSTMConfig {
                    layer_idx,
                    ..Default::default()
                },
                vb.pp("lstm"),
            )?);
        }

        let out = linear(params.hidden_size, class_amount, vb.pp("out"))?;

        Ok(Self {
            embed,
            conv,
            rnn_layers,
            out,
        })
    }

    /// Forward one padded index batch of shape `(rows, seq_len, 1)`.
    ///
    /// Returns per-row log-probabilities of shape `(rows, class_amount)`.
    /// Trailing zero-padding does not disturb predictions; that invariant is
    /// a property of the trained weights, not re-derived here.
    pub fn forward(&self, indices: &Tensor) -> Result<Tensor> {
        let xs = indices.squeeze(D::Minus1)?;
        let xs = self.embed.forward(&xs)?;

        // Conv1d wants (batch, channels, seq)
        let xs = xs.transpose(1, 2)?;
        let xs = self.conv.forward(&xs)?;
        let mut xs = xs.transpose(1, 2)?;

        for layer in &self.rnn_layers {
            let states = layer.seq(&xs)?;
            let hidden: Vec<Tensor> = states.iter().map(|s| s.h().clone()).collect();
            xs = Tensor::stack(&hidden, 1)?;
        }

        // last timestep's hidden state summarizes the name
        let seq_len = xs.dim(1)?;
        let last = xs.narrow(1, seq_len - 1, 1)?.squeeze(1)?;

        let logits = self.out.forward(&last)?;
        Ok(ops::log_softmax(&logits, D::Minus1)?)
    }
}

/// A loaded classifier bound to one model id and device.
#[derive(Debug)]
pub struct ModelRunner {
    model: ConvLstm,
    device: Device,
}

impl ModelRunner {
    /// Resolve artifacts for `model_id` and load the network onto `device`.
    pub fn load(
        store: &dyn ArtifactStore,
        model_id: &str,
        class_amount: usize,
        device: Device,
    ) -> Result<Self> {
        let params = store
            .get_hyperparams(model_id)?
            .ok_or_else(|| EngineError::model(format!("missing config for model {}", model_id)))?;
        let weights = store
            .get_weights(model_id)?
            .ok_or_else(|| EngineError::model(format!("missing weights for model {}", model_id)))?;

        debug!(model_id = %model_id, ?device, "loading model weights");

        // safetensors loading remaps tensors onto the target device
        let vb = VarBuilder::from_buffered_safetensors(weights, DType::F32, &device)?;
        let model = ConvLstm::new(class_amount, &params, vb)?;

        Ok(Self { model, device })
    }

    /// Build a runner from an already-constructed network (tests).
    pub fn from_parts(model: ConvLstm, device: Device) -> Self {
        Self { model, device }
    }

    /// Run every batch through the network sequentially, concatenating
    /// per-row log-probability vectors in input order.
    pub fn run(&self, batches: &[EncodedBatch]) -> Result<Vec<Vec<f32>>> {
        let mut log_probs = Vec::new();

        for batch in batches {
            let indices = Tensor::from_slice(
                &batch.indices,
                (batch.rows, batch.seq_len, 1),
                &self.device,
            )?;
            let output = self.model.forward(&indices)?;
            log_probs.extend(output.to_vec2::<f32>()?);
        }

        Ok(log_probs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::encode_batches;

    fn test_params() -> ModelHyperparams {
        serde_json::from_str(
            r#"{
                "embedding-size": 8,
                "hidden-size": 16,
                "rnn-layers": 2,
                "cnn-parameters": [1, 3, 12]
            }"#,
        )
        .unwrap()
    }

    fn zero_weight_runner(class_amount: usize) -> ModelRunner {
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let model = ConvLstm::new(class_amount, &test_params(), vb).unwrap();
        ModelRunner::from_parts(model, Device::Cpu)
    }

    #[test]
    fn test_select_device_cpu() {
        assert!(matches!(select_device("cpu").unwrap(), Device::Cpu));
        assert!(select_device("auto").is_ok());
        assert!(select_device("npu").is_err());
    }

    #[test]
    fn test_forward_shape_and_log_probs() {
        let runner = zero_weight_runner(4);
        let names = vec!["peter schmidt".to_string(), "cixin liu".to_string()];
        let batches = encode_batches(&names, 128).unwrap();

        let log_probs = runner.run(&batches).unwrap();
        assert_eq!(log_probs.len(), 2);
        assert_eq!(log_probs[0].len(), 4);

        // log-softmax rows sum to 1 in probability space
        for row in &log_probs {
            let total: f32 = row.iter().map(|lp| lp.exp()).sum();
            assert!((total - 1.0).abs() < 1e-4, "sum was {}", total);
        }
    }

    #[test]
    fn test_run_concatenates_batches_in_order() {
        let runner = zero_weight_runner(3);
        let names: Vec<String> = ["anna", "bo", "cecilia", "dan", "ed"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let chunked = runner.run(&encode_batches(&names, 2).unwrap()).unwrap();
        let whole = runner.run(&encode_batches(&names, 128).unwrap()).unwrap();

        assert_eq!(chunked.len(), 5);
        for (a, b) in chunked.iter().zip(whole.iter()) {
            for (x, y) in a.iter().zip(b.iter()) {
                assert!((x - y).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_missing_artifacts_are_model_errors() {
        struct EmptyStore;
        impl ArtifactStore for EmptyStore {
            fn get_weights(&self, _: &str) -> crate::error::Result<Option<Vec<u8>>> {
                Ok(None)
            }
            fn get_hyperparams(&self, _: &str) -> crate::error::Result<Option<ModelHyperparams>> {
                Ok(None)
            }
        }

        let err = ModelRunner::load(&EmptyStore, "ghost", 2, Device::Cpu).unwrap_err();
        assert_eq!(err.error_code(), "MODEL_ERROR");
    }
}
