// The classifier the pad reports to, and a small perceptron that satisfies it.
// The session only knows the call contract; the model below is what the window
// binary plugs in when a model file is configured.

use std::fs;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use log::info;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Maps a flattened grayscale raster (row-major, values in `[0, 1]`) to one
/// score per class.
///
/// `None` is the "could not classify" signal; the session turns it (and an
/// empty vector) into [`Error::Classification`].
pub trait Classifier {
    fn classify(&mut self, input: &[f64], width: usize, height: usize) -> Option<Vec<f64>>;
}

impl<F> Classifier for F
where
    F: FnMut(&[f64], usize, usize) -> Option<Vec<f64>>,
{
    fn classify(&mut self, input: &[f64], width: usize, height: usize) -> Option<Vec<f64>> {
        self(input, width, height)
    }
}

/// Stand-in used when no model is available: every call fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unavailable;

impl Classifier for Unavailable {
    fn classify(&mut self, _: &[f64], _: usize, _: usize) -> Option<Vec<f64>> {
        None
    }
}

/// Index of the highest score; the first one wins a tie.
pub fn best(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &s) in scores.iter().enumerate() {
        if best.is_none_or(|(_, b)| s > b) {
            best = Some((i, s));
        }
    }
    best.map(|(i, _)| i)
}

/// One dense layer: `weights` is `rows x cols` row-major, `biases` has `rows`.
#[derive(Clone, Debug)]
struct Layer {
    rows: usize,
    cols: usize,
    weights: Vec<f64>,
    biases: Vec<f64>,
}

/// Multilayer perceptron: sigmoid hidden layers, softmax output.
#[derive(Clone, Debug)]
pub struct Mlp {
    layers: Vec<Layer>,
    scratch: Vec<f64>,
}

// On-disk shape. Extra per-layer fields (training state) are ignored.
#[derive(Deserialize)]
struct ModelFile {
    layers: Vec<LayerFile>,
}

#[derive(Deserialize)]
struct LayerFile {
    weights: MatrixFile,
    biases: MatrixFile,
}

#[derive(Deserialize)]
struct MatrixFile {
    rows: usize,
    cols: usize,
    data: String,
}

impl MatrixFile {
    /// Base64 of little-endian f64s, checked against `rows * cols`.
    fn decode(&self, what: &str) -> Result<Vec<f64>> {
        let bytes = STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| Error::Model(format!("{what}: {e}")))?;
        if bytes.len() % 8 != 0 {
            return Err(Error::Model(format!("{what}: {} bytes is not a whole number of f64", bytes.len())));
        }

        let values: Vec<f64> = bytes
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
            .collect();
        if values.len() != self.rows * self.cols {
            return Err(Error::Model(format!(
                "{what}: {} values for a {}x{} matrix",
                values.len(),
                self.rows,
                self.cols
            )));
        }
        Ok(values)
    }
}

impl Mlp {
    /// Build from `(rows, cols, weights, biases)` per layer, validating shapes.
    pub fn from_layers(layers: Vec<(usize, usize, Vec<f64>, Vec<f64>)>) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::Model("network has no layers".into()));
        }

        let mut built = Vec::with_capacity(layers.len());
        for (i, (rows, cols, weights, biases)) in layers.into_iter().enumerate() {
            if weights.len() != rows * cols || biases.len() != rows {
                return Err(Error::Model(format!("layer {i}: weights/biases do not match {rows}x{cols}")));
            }
            if let Some(prev) = built.last().map(|l: &Layer| l.rows) {
                if prev != cols {
                    return Err(Error::Model(format!("layer {i}: expects {cols} inputs, previous layer gives {prev}")));
                }
            }
            built.push(Layer { rows, cols, weights, biases });
        }

        let widest = built.iter().map(|l| l.rows).max().unwrap_or(0);
        Ok(Self { layers: built, scratch: Vec::with_capacity(widest) })
    }

    /// Parse the JSON model format.
    pub fn from_json(text: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(text).map_err(|e| Error::Model(e.to_string()))?;

        let mut layers = Vec::with_capacity(file.layers.len());
        for (i, l) in file.layers.iter().enumerate() {
            let weights = l.weights.decode(&format!("layer {i} weights"))?;
            let biases = l.biases.decode(&format!("layer {i} biases"))?;
            layers.push((l.weights.rows, l.weights.cols, weights, biases));
        }
        Self::from_layers(layers)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
        let mlp = Self::from_json(&text)?;
        info!("model {}: {} -> {} over {} layers", path.display(), mlp.inputs(), mlp.outputs(), mlp.layers.len());
        Ok(mlp)
    }

    pub fn inputs(&self) -> usize {
        self.layers.first().map_or(0, |l| l.cols)
    }

    pub fn outputs(&self) -> usize {
        self.layers.last().map_or(0, |l| l.rows)
    }

    fn feed_forward(&mut self, input: &[f64]) -> Vec<f64> {
        let mut activation = input.to_vec();
        let last = self.layers.len() - 1;

        for (i, layer) in self.layers.iter().enumerate() {
            self.scratch.clear();
            for row in 0..layer.rows {
                let weights = &layer.weights[row * layer.cols..(row + 1) * layer.cols];
                let sum: f64 = weights.iter().zip(&activation).map(|(w, a)| w * a).sum();
                self.scratch.push(sum + layer.biases[row]);
            }

            if i == last {
                softmax(&mut self.scratch);
            } else {
                self.scratch.iter_mut().for_each(|v| *v = sigmoid(*v));
            }
            std::mem::swap(&mut activation, &mut self.scratch);
        }
        activation
    }
}

impl Classifier for Mlp {
    fn classify(&mut self, input: &[f64], width: usize, height: usize) -> Option<Vec<f64>> {
        if input.len() != width * height || input.len() != self.inputs() {
            return None;
        }
        Some(self.feed_forward(input))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn softmax(values: &mut [f64]) {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in values.iter_mut() {
        *v /= sum;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn encode(values: &[f64]) -> String {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        STANDARD.encode(bytes)
    }

    #[test]
    fn best_picks_first_maximum() {
        assert_eq!(best(&[]), None);
        assert_eq!(best(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(best(&[0.5, 0.5]), Some(0));
    }

    #[test]
    fn closures_are_classifiers() {
        let mut calls = 0;
        let mut c = |input: &[f64], w: usize, h: usize| {
            calls += 1;
            Some(vec![input.len() as f64, (w * h) as f64])
        };
        assert_eq!(c.classify(&[0.0; 6], 3, 2), Some(vec![6.0, 6.0]));
        assert_eq!(calls, 1);
    }

    #[test]
    fn unavailable_always_fails() {
        assert_eq!(Unavailable.classify(&[0.0], 1, 1), None);
    }

    #[test]
    fn softmax_output_sums_to_one() {
        // 2 inputs -> 2 hidden -> 3 outputs
        let mut mlp = Mlp::from_layers(vec![
            (2, 2, vec![1.0, 0.0, 0.0, 1.0], vec![0.0, 0.0]),
            (3, 2, vec![1.0, 0.0, 0.0, 1.0, -1.0, -1.0], vec![0.0, 0.0, 0.0]),
        ])
        .unwrap();
        let out = mlp.classify(&[0.9, 0.1], 2, 1).unwrap();
        assert_eq!(out.len(), 3);
        assert_relative_eq!(out.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_eq!(best(&out), Some(0));
    }

    #[test]
    fn wrong_input_size_is_a_failure_signal() {
        let mut mlp = Mlp::from_layers(vec![(1, 4, vec![0.0; 4], vec![0.0])]).unwrap();
        assert_eq!(mlp.classify(&[0.0; 3], 3, 1), None);
        assert_eq!(mlp.classify(&[0.0; 4], 3, 1), None);
        assert!(mlp.classify(&[0.0; 4], 2, 2).is_some());
    }

    #[test]
    fn mismatched_layers_are_rejected() {
        let err = Mlp::from_layers(vec![
            (2, 3, vec![0.0; 6], vec![0.0; 2]),
            (1, 5, vec![0.0; 5], vec![0.0]),
        ]);
        assert!(matches!(err, Err(Error::Model(_))));
        assert!(matches!(Mlp::from_layers(vec![]), Err(Error::Model(_))));
    }

    #[test]
    fn parses_json_model() {
        let text = format!(
            r#"{{"layers":[{{
                "weights":{{"rows":2,"cols":1,"data":"{}"}},
                "biases":{{"rows":2,"cols":1,"data":"{}"}},
                "activation":{{"rows":2,"cols":1,"data":""}}
            }}]}}"#,
            encode(&[2.0, -2.0]),
            encode(&[0.0, 0.0]),
        );
        let mut mlp = Mlp::from_json(&text).unwrap();
        assert_eq!((mlp.inputs(), mlp.outputs()), (1, 2));

        let out = mlp.classify(&[1.0], 1, 1).unwrap();
        let e4 = 4.0f64.exp();
        assert_relative_eq!(out[0], e4 / (e4 + 1.0), epsilon = 1e-12);
    }

    #[test]
    fn truncated_matrix_data_is_a_model_error() {
        let text = format!(
            r#"{{"layers":[{{"weights":{{"rows":2,"cols":2,"data":"{}"}},"biases":{{"rows":2,"cols":1,"data":"{}"}}}}]}}"#,
            encode(&[1.0, 2.0, 3.0]),
            encode(&[0.0, 0.0]),
        );
        assert!(matches!(Mlp::from_json(&text), Err(Error::Model(_))));
    }
}
