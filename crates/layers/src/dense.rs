//! Validated dense matrix products.
//!
//! Candle will happily broadcast batched matmuls, which hides mistakes when a
//! caller passes the wrong operand. These wrappers pin the contract to rank-2
//! (and rank-1 for [`matvec`]) operands and report disagreeing inner
//! dimensions as [`LayerError::ShapeMismatch`] before touching the backend.

use candle_core::Tensor;

use crate::{checks, LayerError, Result};

/// Matrix product `a · b` for `a: (m, n)` and `b: (n, p)`, returning `(m, p)`.
pub fn matmul(a: &Tensor, b: &Tensor) -> Result<Tensor> {
    checks::expect_rank("matmul.lhs", a, 2)?;
    checks::expect_rank("matmul.rhs", b, 2)?;
    checks::expect_non_empty("matmul.lhs", a)?;
    checks::expect_non_empty("matmul.rhs", b)?;

    let (m, n) = a.dims2()?;
    let (rows, p) = b.dims2()?;
    if rows != n {
        return Err(LayerError::shape(
            "matmul",
            format!("({m}, {n}) x ({rows}, {p}): inner dimensions {n} and {rows} differ"),
        ));
    }

    Ok(a.contiguous()?.matmul(&b.contiguous()?)?)
}

/// Matrix-vector product `a · v` for `a: (m, n)` and `v: (n,)`, returning `(m,)`.
pub fn matvec(a: &Tensor, v: &Tensor) -> Result<Tensor> {
    checks::expect_rank("matvec.matrix", a, 2)?;
    checks::expect_rank("matvec.vector", v, 1)?;
    checks::expect_non_empty("matvec.matrix", a)?;

    let (m, n) = a.dims2()?;
    let len = v.dims1()?;
    if len != n {
        return Err(LayerError::shape(
            "matvec",
            format!("matrix has {n} columns but vector has length {len} (matrix rows: {m})"),
        ));
    }

    let column = v.unsqueeze(1)?;
    Ok(matmul(a, &column)?.squeeze(1)?)
}

/// Materialised transpose of a rank-2 tensor.
pub fn transpose(a: &Tensor) -> Result<Tensor> {
    checks::expect_rank("transpose", a, 2)?;
    Ok(a.t()?.contiguous()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};

    #[test]
    fn matmul_square_matrices() -> Result<()> {
        let device = Device::Cpu;
        let a = Tensor::new(&[[1f32, 2.], [3., 4.]], &device)?;
        let b = Tensor::new(&[[5f32, 6.], [7., 8.]], &device)?;
        let c = matmul(&a, &b)?;
        assert_eq!(c.to_vec2::<f32>()?, vec![vec![19.0, 22.0], vec![43.0, 50.0]]);
        Ok(())
    }

    #[test]
    fn matmul_row_by_column() -> Result<()> {
        let device = Device::Cpu;
        let a = Tensor::new(&[[1f32, 2., 3.]], &device)?;
        let b = Tensor::new(&[[4f32], [5.], [6.]], &device)?;
        assert_eq!(matmul(&a, &b)?.to_vec2::<f32>()?, vec![vec![32.0]]);
        Ok(())
    }

    #[test]
    fn matmul_identity_is_noop() -> Result<()> {
        let device = Device::Cpu;
        let eye = Tensor::new(&[[1f32, 0.], [0., 1.]], &device)?;
        let b = Tensor::new(&[[5f32, 6.], [7., 8.]], &device)?;
        assert_eq!(matmul(&eye, &b)?.to_vec2::<f32>()?, b.to_vec2::<f32>()?);
        Ok(())
    }

    #[test]
    fn matmul_accepts_transposed_views() -> Result<()> {
        let device = Device::Cpu;
        let a = Tensor::new(&[[1f32, 2.], [3., 4.], [5., 6.]], &device)?;
        let gram = matmul(&a, &a.t()?)?;
        assert_eq!(gram.dims(), &[3, 3]);
        assert_eq!(gram.to_vec2::<f32>()?[0], vec![5.0, 11.0, 17.0]);
        Ok(())
    }

    #[test]
    fn matmul_rejects_inner_dimension_mismatch() -> Result<()> {
        let device = Device::Cpu;
        let a = Tensor::zeros((2, 3), DType::F32, &device)?;
        let b = Tensor::zeros((2, 3), DType::F32, &device)?;
        assert!(matches!(
            matmul(&a, &b),
            Err(LayerError::ShapeMismatch { op: "matmul", .. })
        ));
        Ok(())
    }

    #[test]
    fn matmul_rejects_empty_operands() -> Result<()> {
        let device = Device::Cpu;
        let empty = Tensor::zeros((0, 1), DType::F32, &device)?;
        let b = Tensor::zeros((1, 1), DType::F32, &device)?;
        assert!(matches!(
            matmul(&empty, &b),
            Err(LayerError::EmptyInput { .. })
        ));
        Ok(())
    }

    #[test]
    fn matvec_dot_products_per_row() -> Result<()> {
        let device = Device::Cpu;
        let a = Tensor::new(&[[1f32, 2.], [2., 4.]], &device)?;
        let v = Tensor::new(&[1f32, 2.], &device)?;
        assert_eq!(matvec(&a, &v)?.to_vec1::<f32>()?, vec![5.0, 10.0]);
        Ok(())
    }

    #[test]
    fn matvec_rejects_length_mismatch() -> Result<()> {
        let device = Device::Cpu;
        let a = Tensor::new(&[[1f32, 2.], [2., 4.]], &device)?;
        let v = Tensor::new(&[1f32, 2., 3.], &device)?;
        assert!(matches!(
            matvec(&a, &v),
            Err(LayerError::ShapeMismatch { op: "matvec", .. })
        ));
        Ok(())
    }

    #[test]
    fn transpose_is_contiguous() -> Result<()> {
        let device = Device::Cpu;
        let a = Tensor::new(&[[1f32, 2., 3.], [4., 5., 6.]], &device)?;
        let t = transpose(&a)?;
        assert!(t.is_contiguous());
        assert_eq!(
            t.to_vec2::<f32>()?,
            vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]
        );
        Ok(())
    }
}
