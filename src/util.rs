use crate::error::{Result, SynthesisError};

macro_rules! boxed_slice {
    ($value:expr; $len:expr) => {
        vec![$value; $len].into_boxed_slice()
    };
}

/// Allocate a zeroed buffer, reporting failure instead of aborting.
pub(crate) fn try_zeroed(len: usize, context: &'static str) -> Result<Box<[f64]>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| SynthesisError::AllocationFailure {
            context,
            requested: len,
        })?;
    buffer.resize(len, 0.0);
    Ok(buffer.into_boxed_slice())
}

#[cfg(test)]
mod tests {
    use super::try_zeroed;
    use crate::error::SynthesisError;

    #[test]
    fn zeroed() {
        let buffer = try_zeroed(4, "test").unwrap();
        assert_eq!(&*buffer, &[0.0; 4]);
    }

    #[test]
    fn too_large() {
        let err = try_zeroed(usize::MAX, "huge").unwrap_err();
        assert!(matches!(
            err,
            SynthesisError::AllocationFailure {
                context: "huge",
                ..
            }
        ));
    }
}
