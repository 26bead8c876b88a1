//! Interactive playlist id prompt

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const PROMPT: &str = "Playlist id: ";

/// Write the prompt to `output` and read one line from `input`.
pub async fn read_playlist_id<R, W>(input: R, mut output: W) -> Result<String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(PROMPT.as_bytes()).await?;
    output.flush().await?;

    let line = input
        .lines()
        .next_line()
        .await
        .context("reading playlist id")?
        .context("input closed before a playlist id was entered")?;

    let id = line.trim();
    if id.is_empty() {
        bail!("playlist id must not be empty");
    }
    Ok(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_trimmed_line_after_prompt() {
        let mut output = Vec::new();
        let id = read_playlist_id(&b"  PLrAXtmErZgOeiKm4sgNOknGvNjby9efdf \r\nignored\n"[..], &mut output)
            .await
            .unwrap();

        assert_eq!(id, "PLrAXtmErZgOeiKm4sgNOknGvNjby9efdf");
        assert_eq!(output, PROMPT.as_bytes());
    }

    #[tokio::test]
    async fn empty_line_is_rejected() {
        let err = read_playlist_id(&b"\n"[..], Vec::new()).await.unwrap_err();
        assert!(err.to_string().contains("must not be empty"), "got: {err}");
    }

    #[tokio::test]
    async fn closed_input_is_rejected() {
        let err = read_playlist_id(&b""[..], Vec::new()).await.unwrap_err();
        assert!(err.to_string().contains("input closed"), "got: {err}");
    }
}
