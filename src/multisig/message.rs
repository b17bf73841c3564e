use everscale_crypto::ed25519;
use ton_types::{BuilderData, Cell, IBitstring, SliceData};

use super::{append_cell, MultisigOrder, OrderError, Signature, SIGNATURE_LEN};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SignatureLink {
    pub owner_id: u8,
    pub signature: Signature,
}

/// Raw contents of a serialized order.
///
/// Links are kept in their physical order, duplicates included.
#[derive(Debug, Clone)]
pub struct OrderMessage {
    pub owner_id: u8,
    pub links: Vec<SignatureLink>,
    pub payload: Cell,
}

impl OrderMessage {
    pub fn parse(cell: &Cell) -> Result<Self, OrderError> {
        let mut slice = SliceData::load_cell_ref(cell)?;
        let owner_id = slice.get_next_byte()?;
        let (links, payload) = Self::read_order(&mut slice)?;
        Ok(Self {
            owner_id,
            links,
            payload,
        })
    }

    pub(super) fn read_order(
        slice: &mut SliceData,
    ) -> Result<(Vec<SignatureLink>, Cell), OrderError> {
        let links = match slice.get_next_bit()? {
            true => read_links(slice.checked_drain_reference()?)?,
            false => Vec::new(),
        };

        let mut payload = BuilderData::new();
        payload.append_bytestring(slice)?;
        while slice.remaining_references() > 0 {
            payload.checked_append_reference(slice.checked_drain_reference()?)?;
        }

        Ok((links, payload.into_cell()?))
    }

    pub fn into_order(self) -> MultisigOrder {
        MultisigOrder::from_links(self.payload, self.links)
    }
}

fn read_links(root: Cell) -> Result<Vec<SignatureLink>, OrderError> {
    const LINK_BITS: usize = SIGNATURE_LEN * 8 + 8 + 1;

    let mut links = Vec::new();
    let mut slice = SliceData::load_cell(root)?;
    loop {
        if slice.remaining_bits() != LINK_BITS {
            return Err(OrderError::MalformedOrder);
        }

        let signature = slice
            .get_next_bytes(SIGNATURE_LEN)?
            .try_into()
            .map_err(|_| OrderError::MalformedOrder)?;
        let owner_id = slice.get_next_byte()?;
        links.push(SignatureLink {
            owner_id,
            signature,
        });

        let has_next = slice.get_next_bit()?;
        match (has_next, slice.remaining_references()) {
            (true, 1) => slice = SliceData::load_cell(slice.checked_drain_reference()?)?,
            (false, 0) => return Ok(links),
            _ => return Err(OrderError::MalformedOrder),
        }
    }
}

/// External message body: `signature:bits512` over the order cell hash,
/// followed by the order cell contents
pub fn sign_message_body(order: &Cell, keypair: &ed25519::KeyPair) -> Result<Cell, OrderError> {
    let signature = keypair.sign_raw(order.repr_hash().as_slice());

    let mut builder = BuilderData::new();
    builder.append_raw(&signature, SIGNATURE_LEN * 8)?;
    append_cell(&mut builder, order)?;
    Ok(builder.into_cell()?)
}

pub fn external_message(
    dst: ton_block::MsgAddressInt,
    body: Cell,
) -> Result<ton_block::Message, OrderError> {
    let mut message =
        ton_block::Message::with_ext_in_header(ton_block::ExternalInboundMessageHeader {
            dst,
            ..Default::default()
        });
    message.set_body(SliceData::load_cell(body)?);
    Ok(message)
}
