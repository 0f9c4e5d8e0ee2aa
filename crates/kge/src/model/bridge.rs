//! Conversions between triples / score vectors and burn tensors.

use burn::prelude::*;
use burn::tensor::TensorData;
use corpus::Triple;

/// Split triples into head, relation and tail id tensors of shape `(n,)`.
pub fn triples_to_tensors<B: Backend>(
    triples: &[Triple],
    device: &B::Device,
) -> (Tensor<B, 1, Int>, Tensor<B, 1, Int>, Tensor<B, 1, Int>) {
    let n = triples.len();
    let column = |f: fn(&Triple) -> u32| -> Tensor<B, 1, Int> {
        let ids: Vec<i64> = triples.iter().map(|t| i64::from(f(t))).collect();
        Tensor::from_data(TensorData::new(ids, [n]), device)
    };
    (
        column(|t| t.head),
        column(|t| t.relation),
        column(|t| t.tail),
    )
}

/// Extract f32 values from a burn 1D tensor.
pub fn tensor_to_vec<B: Backend>(tensor: Tensor<B, 1>) -> anyhow::Result<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| anyhow::anyhow!("Failed to read tensor data: {e:?}"))
}

/// Build an `(rows, dim)` float tensor from row vectors.
///
/// Fails if `rows` is empty or ragged.
pub fn rows_to_tensor<B: Backend>(
    rows: &[Vec<f32>],
    device: &B::Device,
) -> anyhow::Result<Tensor<B, 2>> {
    let dim = rows.first().map(Vec::len).unwrap_or(0);
    if dim == 0 {
        anyhow::bail!("cannot build a tensor from empty rows");
    }
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != dim) {
        anyhow::bail!("row {i} has length {}, expected {dim}", row.len());
    }
    let flat: Vec<f32> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    Ok(Tensor::from_data(TensorData::new(flat, [rows.len(), dim]), device))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_triples_to_tensors() {
        let device = Default::default();
        let triples = [Triple::new(1, 0, 2), Triple::new(3, 1, 4)];
        let (h, r, t) = triples_to_tensors::<TestBackend>(&triples, &device);
        assert_eq!(h.dims(), [2]);
        assert_eq!(h.into_data().convert::<i64>().to_vec::<i64>().unwrap(), vec![1, 3]);
        assert_eq!(r.into_data().convert::<i64>().to_vec::<i64>().unwrap(), vec![0, 1]);
        assert_eq!(t.into_data().convert::<i64>().to_vec::<i64>().unwrap(), vec![2, 4]);
    }

    #[test]
    fn test_rows_to_tensor_rejects_ragged() {
        let device = Default::default();
        let ok = rows_to_tensor::<TestBackend>(&[vec![1.0, 2.0], vec![3.0, 4.0]], &device).unwrap();
        assert_eq!(ok.dims(), [2, 2]);
        assert!(rows_to_tensor::<TestBackend>(&[vec![1.0], vec![1.0, 2.0]], &device).is_err());
        assert!(rows_to_tensor::<TestBackend>(&[], &device).is_err());
    }

    #[test]
    fn test_tensor_to_vec() {
        let device = Default::default();
        let t = Tensor::<TestBackend, 1>::from_data(TensorData::new(vec![0.5f32, 1.5], [2]), &device);
        assert_eq!(tensor_to_vec(t).unwrap(), vec![0.5, 1.5]);
    }
}
