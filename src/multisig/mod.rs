use everscale_crypto::ed25519;
use ton_types::{BuilderData, Cell, IBitstring, SliceData, UInt256};

pub use self::message::{external_message, sign_message_body, OrderMessage, SignatureLink};

mod message;

pub const SIGNATURE_LEN: usize = 64;
pub const MAX_PAYLOADS: usize = 3;

pub const DEFAULT_WALLET_ID: u32 = 0;
pub const DEFAULT_QUERY_OFFSET: u32 = 7200;

const SLOT_COUNT: usize = 256;

pub type Signature = [u8; SIGNATURE_LEN];

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct OrderParams {
    pub wallet_id: u32,
    /// Order lifetime in seconds
    pub query_offset: u32,
}

impl Default for OrderParams {
    fn default() -> Self {
        Self {
            wallet_id: DEFAULT_WALLET_ID,
            query_offset: DEFAULT_QUERY_OFFSET,
        }
    }
}

/// Query id with the expiration timestamp in the high 32 bits
pub fn query_id(now: u32, query_offset: u32) -> u64 {
    (now as u64 + query_offset as u64) << 32
}

/// Multisig order header: `wallet_id:uint32 query_id:uint64 ^payload{1,3}`
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct OrderHeader {
    pub wallet_id: u32,
    pub query_id: u64,
}

impl OrderHeader {
    pub fn read(payload: &Cell) -> Result<Self, OrderError> {
        let mut slice = SliceData::load_cell_ref(payload)?;
        Ok(Self {
            wallet_id: slice.get_next_u32()?,
            query_id: slice.get_next_u64()?,
        })
    }

    pub fn expire_at(&self) -> u32 {
        (self.query_id >> 32) as u32
    }
}

/// Action payload with signatures collected from owners.
///
/// Payload never changes after construction, each owner slot holds
/// at most one signature.
#[derive(Clone)]
pub struct MultisigOrder {
    payload: Cell,
    signatures: Box<[Option<Signature>; SLOT_COUNT]>,
}

impl MultisigOrder {
    pub fn from_payload(payload: Cell) -> Self {
        Self {
            payload,
            signatures: Box::new([None; SLOT_COUNT]),
        }
    }

    /// Wraps a single action into an order header
    pub fn with_payload(payload: Cell, params: OrderParams) -> Result<Self, OrderError> {
        Self::with_payloads(&[payload], params)
    }

    /// Wraps up to three actions into one order header
    pub fn with_payloads(payloads: &[Cell], params: OrderParams) -> Result<Self, OrderError> {
        let header = build_order_header(payloads, params, broxus_util::now())?;
        Ok(Self::from_payload(header))
    }

    /// Parses the stored order layout: `signatures:(Maybe ^Link)` followed by the payload
    pub fn from_cell(cell: &Cell) -> Result<Self, OrderError> {
        let mut slice = SliceData::load_cell_ref(cell)?;
        let (links, payload) = OrderMessage::read_order(&mut slice)?;
        Ok(Self::from_links(payload, links))
    }

    /// Parses a cell produced by [`MultisigOrder::to_cell`], returns the submitter id
    pub fn from_message(cell: &Cell) -> Result<(u8, Self), OrderError> {
        let message = OrderMessage::parse(cell)?;
        Ok((message.owner_id, message.into_order()))
    }

    fn from_links(payload: Cell, links: Vec<SignatureLink>) -> Self {
        let mut order = Self::from_payload(payload);
        for link in links {
            order.signatures[link.owner_id as usize] = Some(link.signature);
        }
        order
    }

    pub fn payload(&self) -> &Cell {
        &self.payload
    }

    pub fn signing_hash(&self) -> UInt256 {
        self.payload.repr_hash()
    }

    pub fn header(&self) -> Result<OrderHeader, OrderError> {
        OrderHeader::read(&self.payload)
    }

    /// Signs the payload hash and stores the signature for the slot
    pub fn sign(&mut self, slot: u8, keypair: &ed25519::KeyPair) -> Signature {
        let hash = self.signing_hash();
        let signature = keypair.sign_raw(hash.as_slice());
        self.signatures[slot as usize] = Some(signature);

        tracing::debug!(slot, hash = %hex::encode(hash.as_slice()), "order signed");
        signature
    }

    /// Stores a signature produced elsewhere. Slot is left untouched if
    /// the signature doesn't match the payload.
    pub fn add_signature(
        &mut self,
        slot: u8,
        signature: Signature,
        public_key: &ed25519::PublicKey,
    ) -> Result<(), OrderError> {
        if !public_key.verify_raw(self.signing_hash().as_slice(), &signature) {
            return Err(OrderError::InvalidSignature(slot));
        }
        self.signatures[slot as usize] = Some(signature);
        Ok(())
    }

    /// Copies all signatures from `other`, its entries take precedence.
    ///
    /// NOTE: signatures are not verified here
    pub fn union_signatures(&mut self, other: &Self) {
        if self.payload.repr_hash() != other.payload.repr_hash() {
            tracing::warn!("merging signatures of orders with different payloads");
        }

        for (slot, signature) in other.signatures() {
            self.signatures[slot as usize] = Some(*signature);
        }
    }

    pub fn clear_signatures(&mut self) {
        self.signatures.fill(None);
    }

    pub fn signature(&self, slot: u8) -> Option<&Signature> {
        self.signatures[slot as usize].as_ref()
    }

    /// Iterates signed slots in ascending order
    pub fn signatures(&self) -> impl Iterator<Item = (u8, &Signature)> + '_ {
        self.signatures
            .iter()
            .enumerate()
            .filter_map(|(slot, signature)| Some((slot as u8, signature.as_ref()?)))
    }

    pub fn signature_count(&self) -> usize {
        self.signatures.iter().flatten().count()
    }

    pub fn verify(&self, slot: u8, public_key: &ed25519::PublicKey) -> bool {
        match self.signature(slot) {
            Some(signature) => public_key.verify_raw(self.signing_hash().as_slice(), signature),
            None => false,
        }
    }

    /// Counts slots holding a valid signature for the given owner keys
    pub fn count_valid<'a, I>(&self, public_keys: I) -> usize
    where
        I: IntoIterator<Item = (u8, &'a ed25519::PublicKey)>,
    {
        public_keys
            .into_iter()
            .filter(|(slot, public_key)| self.verify(*slot, public_key))
            .count()
    }

    /// Serializes order for submission:
    /// `owner_id:uint8 signatures:(Maybe ^Link) payload`
    pub fn to_cell(&self, owner_id: u8) -> Result<Cell, OrderError> {
        let chain = build_signature_chain(self.signatures())?;
        self.finalize(owner_id, &chain)
    }

    /// Same layout as [`MultisigOrder::to_cell`], but every link carries
    /// `locked_owner_id` and its signature.
    ///
    /// Produces a structurally valid order which must be rejected by the
    /// contract. Used only to test signature checks.
    pub fn to_adversarial_cell(&self, locked_owner_id: u8) -> Result<Cell, OrderError> {
        let signature = self
            .signature(locked_owner_id)
            .ok_or(OrderError::MissingSignature(locked_owner_id))?;

        let chain =
            build_signature_chain(self.signatures().map(|_| (locked_owner_id, signature)))?;
        self.finalize(locked_owner_id, &chain)
    }

    fn finalize(&self, owner_id: u8, chain: &BuilderData) -> Result<Cell, OrderError> {
        let mut builder = BuilderData::new();
        builder.append_u8(owner_id)?.append_builder(chain)?;
        append_cell(&mut builder, &self.payload)?;
        Ok(builder.into_cell()?)
    }
}

impl PartialEq for MultisigOrder {
    fn eq(&self, other: &Self) -> bool {
        self.payload.repr_hash() == other.payload.repr_hash() && self.signatures == other.signatures
    }
}

impl Eq for MultisigOrder {}

impl std::fmt::Debug for MultisigOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultisigOrder")
            .field("payload", &hex::encode(self.signing_hash().as_slice()))
            .field("slots", &self.signatures().map(|(slot, _)| slot).collect::<Vec<_>>())
            .finish()
    }
}

fn build_order_header(
    payloads: &[Cell],
    params: OrderParams,
    now: u32,
) -> Result<Cell, OrderError> {
    match payloads.len() {
        0 => return Err(OrderError::TooFewPayloads),
        n if n > MAX_PAYLOADS => return Err(OrderError::TooManyPayloads(n)),
        _ => {}
    }

    let mut builder = BuilderData::new();
    builder
        .append_u32(params.wallet_id)?
        .append_u64(query_id(now, params.query_offset))?;
    for payload in payloads {
        builder.checked_append_reference(payload.clone())?;
    }
    Ok(builder.into_cell()?)
}

/// Builds a right-folded chain. Each link is
/// `signature:bits512 owner_id:uint8 next:(Maybe ^Link)`
fn build_signature_chain<'a, I>(links: I) -> Result<BuilderData, OrderError>
where
    I: IntoIterator<Item = (u8, &'a Signature)>,
{
    let mut chain = BuilderData::new();
    chain.append_bit_zero()?;

    for (owner_id, signature) in links {
        let mut link = BuilderData::new();
        link.append_raw(signature, SIGNATURE_LEN * 8)?
            .append_u8(owner_id)?
            .append_builder(&chain)?;

        let mut next = BuilderData::new();
        next.append_bit_one()?
            .checked_append_reference(link.into_cell()?)?;
        chain = next;
    }

    Ok(chain)
}

/// Appends cell bits and references directly into the builder
fn append_cell(builder: &mut BuilderData, cell: &Cell) -> Result<(), OrderError> {
    builder.append_bytestring(&SliceData::load_cell_ref(cell)?)?;
    for i in 0..cell.references_count() {
        builder.checked_append_reference(cell.reference(i)?)?;
    }
    Ok(())
}

#[derive(thiserror::Error, Debug)]
pub enum OrderError {
    #[error("there must be at least one payload")]
    TooFewPayloads,
    #[error("must have 3 or less payloads, got {0}")]
    TooManyPayloads(usize),
    #[error("invalid signature for slot {0}")]
    InvalidSignature(u8),
    #[error("no signature for slot {0}")]
    MissingSignature(u8),
    #[error("malformed signature chain")]
    MalformedOrder,
    #[error("invalid cell: {0}")]
    Cell(anyhow::Error),
}

impl From<anyhow::Error> for OrderError {
    fn from(e: anyhow::Error) -> Self {
        Self::Cell(e)
    }
}
