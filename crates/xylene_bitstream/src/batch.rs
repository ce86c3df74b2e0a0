//! Parallel decoding of independent inputs.

use crate::container::BitstreamContainer;
use crate::error::DecodeError;
use crate::reader::{decode, DecodeOptions};
use rayon::prelude::*;
use xylene_diagnostics::Diagnostics;

/// Decodes every input with the same options.
///
/// Inputs share nothing but the read-only options (and the database they
/// borrow), so each is decoded on the rayon pool. Results are returned in
/// input order and are identical to decoding each input on its own.
pub fn decode_many<I>(
    inputs: &[I],
    options: &DecodeOptions<'_>,
) -> Vec<Result<(BitstreamContainer, Diagnostics), DecodeError>>
where
    I: AsRef<[u8]> + Sync,
{
    tracing::debug!(inputs = inputs.len(), "decoding batch");
    inputs
        .par_iter()
        .map(|input| decode(input.as_ref(), options))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StreamBuilder;

    #[test]
    fn results_follow_input_order() {
        let inputs: Vec<Vec<u8>> = (0..8u32)
            .map(|i| {
                StreamBuilder::new()
                    .rcrc()
                    .wcfg()
                    .far(i)
                    .fdri(&[i])
                    .crc()
                    .desync()
                    .build()
            })
            .collect();
        let options = DecodeOptions::default().with_frame_words(1);
        let results = decode_many(&inputs, &options);
        assert_eq!(results.len(), 8);
        for (i, (result, input)) in results.iter().zip(&inputs).enumerate() {
            let (container, diags) = result.as_ref().unwrap();
            let (single, single_diags) = decode(input, &options).unwrap();
            assert_eq!(container.frames(), single.frames());
            assert_eq!(diags, &single_diags);
            assert_eq!(container.frames().len(), 1, "input {i}");
        }
    }

    #[test]
    fn failures_stay_isolated() {
        let good = StreamBuilder::new().rcrc().crc().desync().build();
        let inputs = vec![good.clone(), vec![0u8; 16], good];
        let results = decode_many(&inputs, &DecodeOptions::default());
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(DecodeError::SyncNotFound { .. })));
        assert!(results[2].is_ok());
    }
}
