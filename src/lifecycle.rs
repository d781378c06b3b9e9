use crate::{retry, CheckError, Request, TimeoutArg, UrlOpener};

/// Checks that closing a response closes its transport, and that a second
/// `close()` leaves it closed.
pub async fn check_close_releases_transport<C>(
    client: &C,
    target: &Request,
) -> Result<(), CheckError>
where
    C: UrlOpener + ?Sized,
{
    let mut response = retry::open_with_retry(client, target, TimeoutArg::Inherit).await?;
    if response.transport().closed {
        return Err(CheckError::TransportNotOpen {
            url: target.url.clone(),
        });
    }

    response.close();
    if !response.transport().closed {
        return Err(CheckError::TransportLeak {
            url: target.url.clone(),
        });
    }

    response.close();
    if !response.transport().closed {
        return Err(CheckError::TransportLeak {
            url: target.url.clone(),
        });
    }
    Ok(())
}
