//! Backend abstraction - CUDA (GPU) or NdArray (CPU)
//!
//! The compute backend is chosen at build time: the `cuda` feature selects
//! the CUDA backend, otherwise training runs on the NdArray CPU backend.
//! The `--device` CLI string is resolved against whichever backend was
//! compiled in.

use burn::backend::Autodiff;

use crate::utils::error::{Error, Result};

#[cfg(feature = "cuda")]
pub type DefaultBackend = burn_cuda::Cuda;

#[cfg(not(feature = "cuda"))]
pub type DefaultBackend = burn::backend::NdArray;

/// The default autodiff backend for training
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Device type of the compiled-in backend
pub type Device = <DefaultBackend as burn::tensor::backend::Backend>::Device;

/// Get a human-readable name for the current backend
pub fn backend_name() -> &'static str {
    #[cfg(feature = "cuda")]
    {
        "CUDA (GPU)"
    }

    #[cfg(not(feature = "cuda"))]
    {
        "NdArray (CPU)"
    }
}

/// Resolve a device identifier such as `cpu`, `cuda` or `cuda:1` to a
/// device of the compiled-in backend.
///
/// Requesting a CUDA device from a CPU-only build falls back to the CPU
/// with a warning; requesting `cpu` from a CUDA build is an error since
/// the CUDA backend has no CPU device.
pub fn resolve_device(spec: &str) -> Result<Device> {
    let spec = spec.trim();

    #[cfg(feature = "cuda")]
    {
        match parse_cuda_index(spec)? {
            Some(index) => Ok(burn_cuda::CudaDevice::new(index)),
            None => Err(Error::Device(
                "this build uses the CUDA backend; pass a device like 'cuda:0'".to_string(),
            )),
        }
    }

    #[cfg(not(feature = "cuda"))]
    {
        match parse_cuda_index(spec)? {
            Some(_) => {
                tracing::warn!("'{spec}' requested but this build has no CUDA support; using cpu");
                Ok(burn::backend::ndarray::NdArrayDevice::Cpu)
            }
            None => Ok(burn::backend::ndarray::NdArrayDevice::Cpu),
        }
    }
}

/// Parse a device spec into `Some(cuda_index)`, `None` for `cpu`, or an
/// error for anything unrecognized.
fn parse_cuda_index(spec: &str) -> Result<Option<usize>> {
    if spec == "cpu" {
        return Ok(None);
    }

    if let Some(rest) = spec.strip_prefix("cuda") {
        if rest.is_empty() {
            return Ok(Some(0));
        }
        if let Some(index) = rest.strip_prefix(':') {
            return index
                .parse::<usize>()
                .map(Some)
                .map_err(|_| Error::Device(format!("Invalid CUDA device index in '{spec}'")));
        }
    }

    Err(Error::Device(format!(
        "Unknown device '{spec}' (expected 'cpu', 'cuda' or 'cuda:N')"
    )))
}
