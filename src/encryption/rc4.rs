// RC4 is small enough to carry here; the RustCrypto implementation requires the key length as
// a type parameter, while PDF keys range from 5 to 16 bytes at run time.
#[derive(Clone)]
pub struct Rc4 {
    initial_state: [u8; 256],
}

impl Rc4 {
    /// Runs the key schedule. `key` must hold between 1 and 256 bytes.
    pub fn new<Key: AsRef<[u8]>>(key: Key) -> Self {
        let key = key.as_ref();
        debug_assert!(!key.is_empty() && key.len() <= 256);

        let mut initial_state = [0_u8; 256];
        for (i, v) in initial_state.iter_mut().enumerate() {
            *v = i as u8;
        }

        if key.is_empty() {
            return Self { initial_state };
        }

        let mut j = 0_u8;
        for i in 0..256 {
            j = j.wrapping_add(initial_state[i]).wrapping_add(key[i % key.len()]);
            initial_state.swap(i, j as usize);
        }

        Self { initial_state }
    }

    /// XORs the keystream into `data` in place.
    pub fn apply_keystream(&self, data: &mut [u8]) {
        let mut state = self.initial_state;
        let mut i = 0_u8;
        let mut j = 0_u8;
        for byte in data {
            i = i.wrapping_add(1);
            j = j.wrapping_add(state[i as usize]);
            state.swap(i as usize, j as usize);
            *byte ^= state[(state[i as usize].wrapping_add(state[j as usize])) as usize];
        }
    }

    /// Encrypts or decrypts `input` into a new buffer; RC4 is symmetric.
    pub fn process<Input: AsRef<[u8]>>(&self, input: Input) -> Vec<u8> {
        let mut output = input.as_ref().to_vec();
        self.apply_keystream(&mut output);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::Rc4;

    fn hex(s: &str) -> Vec<u8> {
        s.as_bytes()
            .chunks_exact(2)
            .map(|pair| u8::from_str_radix(std::str::from_utf8(pair).unwrap(), 16).unwrap())
            .collect()
    }

    #[test]
    fn rc4_works() {
        let cases = [
            // Key, Plain, Cipher
            ("Key", "Plaintext", "BBF316E8D940AF0AD3"),
            ("Wiki", "pedia", "1021BF0420"),
            ("Secret", "Attack at dawn", "45A01F645FC35B383552544B9BF5"),
        ];

        for (key, plain, cipher) in cases {
            let rc4 = Rc4::new(key);
            assert_eq!(rc4.process(plain), hex(cipher));
            assert_eq!(rc4.process(hex(cipher)), plain.as_bytes());
        }
    }
}
