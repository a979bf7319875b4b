// ============================================================
// Layer 5 - Transformer Question Classifier
// ============================================================
// BERT-style encoder over [CLS] question [SEP] with a linear
// head on the [CLS] position:
//
//   token + position embeddings
//     → N × (self-attention → add & norm → GELU FFN → add & norm)
//     → final LayerNorm → [CLS] vector → Linear(d_model, num_labels)
//
// Padding positions are masked out of attention.

use burn::{
    nn::{
        attention::{MhaInput, MultiHeadAttention, MultiHeadAttentionConfig},
        loss::CrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Embedding, EmbeddingConfig,
        LayerNorm, LayerNormConfig,
        Linear, LinearConfig,
    },
    prelude::*,
};

use crate::data::batcher::ClassificationBatch;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally. Do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct TransformerClassifierConfig {
    pub vocab_size:  usize,
    pub max_seq_len: usize,
    pub d_model:     usize,
    pub num_heads:   usize,
    pub num_layers:  usize,
    pub d_ff:        usize,
    pub dropout:     f64,
    pub num_labels:  usize,
}

impl TransformerClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TransformerClassifier<B> {
        let token_embedding    = EmbeddingConfig::new(self.vocab_size, self.d_model).init(device);
        let position_embedding = EmbeddingConfig::new(self.max_seq_len, self.d_model).init(device);
        let layers: Vec<EncoderBlock<B>> = (0..self.num_layers)
            .map(|_| self.build_encoder_block(device))
            .collect();
        let final_norm = LayerNormConfig::new(self.d_model).init(device);
        let classifier = LinearConfig::new(self.d_model, self.num_labels).init(device);
        let dropout    = DropoutConfig::new(self.dropout).init();
        TransformerClassifier {
            token_embedding, position_embedding, layers,
            final_norm, classifier, dropout,
        }
    }

    fn build_encoder_block<B: Backend>(&self, device: &B::Device) -> EncoderBlock<B> {
        let self_attn   = MultiHeadAttentionConfig::new(self.d_model, self.num_heads)
            .with_dropout(self.dropout)
            .init(device);
        let ffn_linear1 = LinearConfig::new(self.d_model, self.d_ff).init(device);
        let ffn_linear2 = LinearConfig::new(self.d_ff, self.d_model).init(device);
        let norm1   = LayerNormConfig::new(self.d_model).init(device);
        let norm2   = LayerNormConfig::new(self.d_model).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        EncoderBlock { self_attn, ffn_linear1, ffn_linear2, norm1, norm2, dropout }
    }
}

#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    pub self_attn:   MultiHeadAttention<B>,
    pub ffn_linear1: Linear<B>,
    pub ffn_linear2: Linear<B>,
    pub norm1:       LayerNorm<B>,
    pub norm2:       LayerNorm<B>,
    pub dropout:     Dropout,
}

impl<B: Backend> EncoderBlock<B> {
    /// x: [batch, seq_len, d_model], padding_mask: [batch, seq_len] (true = pad)
    pub fn forward(&self, x: Tensor<B, 3>, padding_mask: Tensor<B, 2, Bool>) -> Tensor<B, 3> {
        let attn_input  = MhaInput::self_attn(x.clone()).mask_pad(padding_mask);
        let attn_output = self.self_attn.forward(attn_input).context;
        let x = self.norm1.forward(x + self.dropout.forward(attn_output));
        let ffn_out = self.ffn_linear2.forward(
            burn::tensor::activation::gelu(self.ffn_linear1.forward(x.clone()))
        );
        self.norm2.forward(x + self.dropout.forward(ffn_out))
    }
}

/// Transformer encoder with a linear classification head on the
/// [CLS] position.
#[derive(Module, Debug)]
pub struct TransformerClassifier<B: Backend> {
    pub token_embedding:    Embedding<B>,
    pub position_embedding: Embedding<B>,
    pub layers:             Vec<EncoderBlock<B>>,
    pub final_norm:         LayerNorm<B>,
    pub classifier:         Linear<B>,
    pub dropout:            Dropout,
}

#[derive(Debug)]
pub struct ClassificationOutput<B: Backend> {
    pub loss:    Tensor<B, 1>,
    pub logits:  Tensor<B, 2>,
    pub targets: Tensor<B, 1, Int>,
}

impl<B: Backend> TransformerClassifier<B> {
    /// input_ids: [batch, seq_len] → logits: [batch, num_labels]
    pub fn forward(
        &self,
        input_ids:    Tensor<B, 2, Int>,
        padding_mask: Tensor<B, 2, Bool>,
    ) -> Tensor<B, 2> {
        let [batch_size, seq_len] = input_ids.dims();

        let tok_emb = self.token_embedding.forward(input_ids);

        // Self-attention is permutation-invariant, so position must be injected explicitly.
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &tok_emb.device())
            .reshape([1, seq_len])
            .expand([batch_size, seq_len]);
        let pos_emb = self.position_embedding.forward(positions);

        let mut x = self.dropout.forward(tok_emb + pos_emb);
        for layer in &self.layers {
            x = layer.forward(x, padding_mask.clone());
        }
        let x = self.final_norm.forward(x); // [batch, seq_len, d_model]

        let [_, _, d_model] = x.dims();
        let cls = x
            .slice([0..batch_size, 0..1, 0..d_model])
            .reshape([batch_size, d_model]);

        self.classifier.forward(self.dropout.forward(cls))
    }

    /// Forward pass plus cross-entropy against the batch labels.
    pub fn forward_classification(&self, batch: ClassificationBatch<B>) -> ClassificationOutput<B> {
        let targets = batch.labels;
        let logits  = self.forward(batch.input_ids, batch.padding_mask);
        let loss    = CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits.clone(), targets.clone());

        ClassificationOutput { loss, logits, targets }
    }
}
